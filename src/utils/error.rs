// src/utils/error.rs
use thiserror::Error;

// Define specific error types for different parts of the application
#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error), // Automatically convert reqwest errors

    #[error("HTTP error {status}: {message}")]
    Http {
        status: reqwest::StatusCode,
        message: String,
    },

    #[error("Completion service rate limit exceeded after {0} attempts")]
    RateLimited(u32),

    #[error("Failed to parse completion response: {0}")]
    Parse(String),

    #[error("OPENAI_API_KEY is not set (export it or add it to .env)")]
    MissingApiKey,
}

impl ExtractionError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ExtractionError::Network(e) => {
                e.is_timeout() || e.is_connect() || e.is_request() || e.is_body()
            }
            ExtractionError::Http { status, .. } => {
                *status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ExtractionError::RateLimited(_)
            | ExtractionError::Parse(_)
            | ExtractionError::MissingApiKey => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("Extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Data processing failed: {0}")]
    Processing(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_transience() {
        let server_error = ExtractionError::Http {
            status: reqwest::StatusCode::BAD_GATEWAY,
            message: "upstream".to_string(),
        };
        let throttled = ExtractionError::Http {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            message: "slow down".to_string(),
        };
        let unauthorized = ExtractionError::Http {
            status: reqwest::StatusCode::UNAUTHORIZED,
            message: "bad key".to_string(),
        };

        assert!(server_error.is_transient());
        assert!(throttled.is_transient());
        assert!(!unauthorized.is_transient());
        assert!(!ExtractionError::Parse("eof".to_string()).is_transient());
        assert!(!ExtractionError::MissingApiKey.is_transient());
    }

    #[test]
    fn test_app_error_wraps_extraction_error() {
        let err: AppError = ExtractionError::RateLimited(4).into();
        assert_eq!(
            err.to_string(),
            "Extraction failed: Completion service rate limit exceeded after 4 attempts"
        );
    }
}
