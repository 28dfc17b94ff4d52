//! Error handler for converting AppError to HTTP responses.
//!
//! Every error body has the [`ErrorResponse`] shape and carries the id of the
//! request that produced it, so a client report can be matched to the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::request_id::current_request_id;
use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - NotFound → 404
    /// - Duplicate, Conflict → 409
    /// - Validation, ValidationErrors, BadRequest → 400
    /// - UnprocessableContent → 422
    /// - Unauthorized → 401
    /// - Unavailable, ConnectionPool → 503
    /// - Database, Configuration, Internal → 500
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        let error_response = match &self {
            AppError::NotFound { entity, field, value } => {
                ErrorResponse::not_found_error(entity, field, value)
            }
            AppError::Duplicate { entity, field, value } => {
                ErrorResponse::duplicate_error(entity, field, value)
            }
            AppError::Conflict { message } => ErrorResponse::new("CONFLICT", message),
            AppError::Validation { field, reason } => {
                ErrorResponse::validation_error(field, reason)
            }
            AppError::ValidationErrors { errors } => {
                ErrorResponse::new("VALIDATION_ERROR", "Request validation failed")
                    .with_details(json!({ "errors": errors }))
            }
            AppError::BadRequest { message } => ErrorResponse::new("BAD_REQUEST", message),
            AppError::UnprocessableContent { message } => {
                ErrorResponse::new("UNPROCESSABLE_CONTENT", message)
            }
            AppError::Unauthorized { message } => ErrorResponse::new("UNAUTHORIZED", message),
            AppError::Database { operation, .. } => ErrorResponse::new(
                "DATABASE_ERROR",
                &format!("Database operation failed: {}", operation),
            )
            .with_details(json!({ "operation": operation })),
            AppError::Unavailable { operation, .. } => ErrorResponse::new(
                "SERVICE_UNAVAILABLE",
                &format!("Storage unavailable during {}", operation),
            ),
            AppError::Configuration { key, .. } => ErrorResponse::new(
                "CONFIGURATION_ERROR",
                &format!("Configuration error: {}", key),
            )
            .with_details(json!({ "key": key })),
            AppError::ConnectionPool { .. } => {
                ErrorResponse::new("SERVICE_UNAVAILABLE", "Database connection unavailable")
            }
            AppError::Internal { .. } => {
                ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred")
            }
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, status = status.as_u16(), "Request failed");
        }

        let error_response = error_response.with_request_id(current_request_id());
        (status, Json(error_response)).into_response()
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    match error {
        AppError::NotFound { .. } => StatusCode::NOT_FOUND,
        AppError::Duplicate { .. } | AppError::Conflict { .. } => StatusCode::CONFLICT,
        AppError::Validation { .. }
        | AppError::ValidationErrors { .. }
        | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::UnprocessableContent { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Unavailable { .. } | AppError::ConnectionPool { .. } => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        AppError::Database { .. } | AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::request_id::CURRENT_REQUEST_ID;
    use crate::error::ValidationFieldError;
    use serde_json::Value;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            error_to_status_code(&AppError::not_found("schedule", 1)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_to_status_code(&AppError::conflict("already confirmed")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            error_to_status_code(&AppError::validation("timezone", "unsupported")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&AppError::Unauthorized {
                message: "bad secret".to_string()
            }),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            error_to_status_code(&AppError::Unavailable {
                operation: "claim schedule".to_string(),
                source: anyhow::anyhow!("connection reset"),
            }),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            error_to_status_code(&AppError::Internal {
                source: anyhow::anyhow!("boom")
            }),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let response = AppError::Internal {
            source: anyhow::anyhow!("password=hunter2"),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["code"], "INTERNAL_ERROR");
        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_validation_errors_carry_fields() {
        let response = AppError::ValidationErrors {
            errors: vec![ValidationFieldError {
                field: "name".to_string(),
                message: "Name must be between 1 and 255 characters".to_string(),
            }],
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["details"]["errors"][0]["field"], "name");
    }

    #[tokio::test]
    async fn test_error_body_includes_request_id() {
        let response = CURRENT_REQUEST_ID
            .scope("req-42".to_string(), async {
                AppError::conflict("schedule is already confirmed").into_response()
            })
            .await;

        let body = body_json(response).await;
        assert_eq!(body["code"], "CONFLICT");
        assert_eq!(body["request_id"], "req-42");
    }

    #[tokio::test]
    async fn test_error_body_without_request_id() {
        let body = body_json(AppError::not_found("workspace", "w1").into_response()).await;
        assert!(body.get("request_id").is_none());
        assert_eq!(body["details"]["value"], "w1");
    }
}
