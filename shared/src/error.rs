//! Error types for the calendar Lambda functions and clients.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while serving or consuming calendar events.
#[derive(Error, Debug)]
pub enum Error {
    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Non-success response from a remote calendar endpoint
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Transport error talking to a remote endpoint
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// DynamoDB item conversion error
    #[error("Item conversion error: {0}")]
    Item(#[from] serde_dynamo::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Validation(_) => 400,
            Error::NotFound(_) => 404,
            Error::Api { status, .. } => *status,
            _ => 500,
        }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        Error::Validation(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(Error::Validation("bad".into()).status_code(), 400);
        assert_eq!(Error::NotFound("evt-1".into()).status_code(), 404);
        assert_eq!(Error::Aws("throttled".into()).status_code(), 500);
        assert_eq!(
            Error::Api {
                status: 502,
                message: "bad gateway".into()
            }
            .status_code(),
            502
        );
    }
}
