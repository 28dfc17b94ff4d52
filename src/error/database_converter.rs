use crate::error::{AppError, TransientSignatures};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to structured AppError variants.
///
/// This is the only place where driver messages are inspected: connectivity
/// losses become [`AppError::Unavailable`], constraint failures become
/// `Duplicate`/`Validation`, everything else `Database`.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(kind, info) => {
                Self::convert_database_error(kind, info, operation)
            }
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => {
                let message = other.to_string();
                if TransientSignatures::matches(&message) {
                    AppError::Unavailable {
                        operation: operation.to_string(),
                        source: anyhow::Error::from(other),
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::from(other),
                    }
                }
            }
        }
    }

    fn convert_database_error(
        kind: DatabaseErrorKind,
        info: Box<dyn diesel::result::DatabaseErrorInformation + Send + Sync>,
        operation: &str,
    ) -> AppError {
        let message = info.message().to_string();

        match kind {
            DatabaseErrorKind::ClosedConnection => AppError::Unavailable {
                operation: operation.to_string(),
                source: anyhow::Error::msg(message),
            },
            DatabaseErrorKind::UniqueViolation => AppError::Duplicate {
                entity: info.table_name().unwrap_or("resource").to_string(),
                field: info
                    .constraint_name()
                    .unwrap_or("unique")
                    .to_string(),
                value: info.details().unwrap_or_default().to_string(),
            },
            DatabaseErrorKind::NotNullViolation | DatabaseErrorKind::CheckViolation => {
                AppError::Validation {
                    field: info
                        .column_name()
                        .or(info.constraint_name())
                        .unwrap_or("unknown")
                        .to_string(),
                    reason: message,
                }
            }
            DatabaseErrorKind::ForeignKeyViolation => AppError::Validation {
                field: info.constraint_name().unwrap_or("reference").to_string(),
                reason: "Invalid reference to a related record".to_string(),
            },
            _ if TransientSignatures::matches(&message) => AppError::Unavailable {
                operation: operation.to_string(),
                source: anyhow::Error::msg(message),
            },
            _ => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", message)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    // Mock database error information for testing
    struct MockDatabaseErrorInfo {
        message: String,
        constraint_name: Option<String>,
    }

    impl diesel::result::DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            Some("schedules")
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    fn database_error(kind: DatabaseErrorKind, message: &str, constraint: Option<&str>) -> DieselError {
        DieselError::DatabaseError(
            kind,
            Box::new(MockDatabaseErrorInfo {
                message: message.to_string(),
                constraint_name: constraint.map(String::from),
            }),
        )
    }

    #[test]
    fn test_closed_connection_is_transient() {
        let error = database_error(
            DatabaseErrorKind::ClosedConnection,
            "server closed the connection unexpectedly",
            None,
        );
        let result = DatabaseErrorConverter::convert_diesel_error(error, "claim schedule");
        assert!(result.is_transient());
    }

    #[test]
    fn test_unknown_kind_with_transient_message() {
        let error = database_error(
            DatabaseErrorKind::Unknown,
            "terminating connection due to administrator command",
            None,
        );
        let result = DatabaseErrorConverter::convert_diesel_error(error, "finalize");
        assert!(matches!(result, AppError::Unavailable { .. }));
    }

    #[test]
    fn test_unique_violation_maps_to_duplicate() {
        let error = database_error(
            DatabaseErrorKind::UniqueViolation,
            "duplicate key value violates unique constraint \"published_posts_schedule_id_key\"",
            Some("published_posts_schedule_id_key"),
        );
        match DatabaseErrorConverter::convert_diesel_error(error, "insert") {
            AppError::Duplicate { entity, field, .. } => {
                assert_eq!(entity, "schedules");
                assert_eq!(field, "published_posts_schedule_id_key");
            }
            other => panic!("Expected Duplicate error, got: {:?}", other),
        }
    }

    #[test]
    fn test_check_violation_is_not_transient() {
        let error = database_error(
            DatabaseErrorKind::CheckViolation,
            "new row for relation \"schedules\" violates check constraint \"schedules_single_source\"",
            Some("schedules_single_source"),
        );
        let result = DatabaseErrorConverter::convert_diesel_error(error, "insert schedule");
        assert!(!result.is_transient());
        assert!(matches!(result, AppError::Validation { .. }));
    }

    #[test]
    fn test_not_found() {
        let result = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find");
        assert!(matches!(result, AppError::NotFound { .. }));
    }
}
