mod app_error;
mod database_converter;
mod transient;

pub use app_error::{AppError, AppResult, ValidationFieldError};
pub use database_converter::DatabaseErrorConverter;
pub use transient::TransientSignatures;
