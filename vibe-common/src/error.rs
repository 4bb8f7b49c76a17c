//! Common error types for Vibe

use thiserror::Error;

/// Common result type for Vibe operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across the Vibe crates
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level HTTP failure (connection refused, timeout, decode)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Service returned {status}: {detail}")]
    Status { status: u16, detail: String },

    /// JSON encoding or decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Single inline message shown to the user when a request fails.
    ///
    /// Network failures never reach the session as errors; they are rendered
    /// through this and stored as a string.
    pub fn user_message(&self) -> String {
        match self {
            Error::Http(e) if e.is_timeout() => {
                "The recommendation service took too long to answer. Please try again.".to_string()
            }
            Error::Http(e) if e.is_connect() => {
                "Could not reach the recommendation service.".to_string()
            }
            Error::Http(_) => "Request to the recommendation service failed.".to_string(),
            Error::Status { detail, .. } if !detail.is_empty() => detail.clone(),
            Error::Status { status, .. } => {
                format!("The recommendation service returned an error ({}).", status)
            }
            Error::Json(_) => "The recommendation service sent an unreadable reply.".to_string(),
            Error::InvalidInput(msg) => msg.clone(),
            Error::Io(_) | Error::Config(_) => self.to_string(),
        }
    }

    /// True for failures that came from talking to the service
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Status { .. } | Error::Json(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_detail_is_shown_verbatim() {
        let err = Error::Status {
            status: 400,
            detail: "No valid artists found".to_string(),
        };
        assert_eq!(err.user_message(), "No valid artists found");
        assert!(err.is_network());
    }

    #[test]
    fn test_status_without_detail_mentions_code() {
        let err = Error::Status {
            status: 503,
            detail: String::new(),
        };
        assert!(err.user_message().contains("503"));
    }

    #[test]
    fn test_config_error_is_not_network() {
        let err = Error::Config("bad".to_string());
        assert!(!err.is_network());
        assert_eq!(err.user_message(), "Configuration error: bad");
    }
}
