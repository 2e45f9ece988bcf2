//! Error types module
//!
//! All request-level failures are unified under the `AppError` enum; the
//! `ErrorMetadata` trait lets each variant describe its own HTTP mapping so
//! the API layer renders every error the same way.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like degraded features
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "invalid_input")
    fn error_code(&self) -> &'static str;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Image processing error: {0}")]
    ImageProcessing(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("File too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        match self {
            AppError::InvalidInput(_) => 400,
            AppError::NotFound(_) => 404,
            AppError::PayloadTooLarge(_) => 413,
            AppError::Storage(_)
            | AppError::ImageProcessing(_)
            | AppError::Ledger(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => 500,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage_error",
            AppError::ImageProcessing(_) => "image_processing_error",
            AppError::Ledger(_) => "ledger_error",
            AppError::InvalidInput(_) => "invalid_input",
            AppError::NotFound(_) => "not_found",
            AppError::PayloadTooLarge(_) => "payload_too_large",
            AppError::Internal(_) | AppError::InternalWithSource { .. } => "internal_error",
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
            AppError::NotFound(msg) => format!("Not found: {}", msg),
            AppError::PayloadTooLarge(msg) => format!("File too large: {}", msg),
            // Internal details stay in the logs, not in the response body.
            AppError::Storage(_) => "Storage operation failed".to_string(),
            AppError::ImageProcessing(_) => "Image processing failed".to_string(),
            AppError::Ledger(_) => "Ledger update failed".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::InvalidInput(_) | AppError::NotFound(_) | AppError::PayloadTooLarge(_) => {
                LogLevel::Debug
            }
            AppError::Ledger(_) => LogLevel::Warn,
            AppError::Storage(_)
            | AppError::ImageProcessing(_)
            | AppError::Internal(_)
            | AppError::InternalWithSource { .. } => LogLevel::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            AppError::InvalidInput("task_id required".into()).http_status_code(),
            400
        );
        assert_eq!(AppError::NotFound("x".into()).http_status_code(), 404);
        assert_eq!(
            AppError::PayloadTooLarge("60 MB".into()).http_status_code(),
            413
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AppError::Storage("bucket exploded".into());
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.client_message().contains("bucket"));
    }

    #[test]
    fn test_log_levels() {
        assert_eq!(
            AppError::InvalidInput("x".into()).log_level(),
            LogLevel::Debug
        );
        assert_eq!(AppError::Ledger("x".into()).log_level(), LogLevel::Warn);
        assert_eq!(AppError::Internal("x".into()).log_level(), LogLevel::Error);
    }
}
