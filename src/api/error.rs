//! Error types for the clinical records API client

use thiserror::Error;

/// Fallback text when the server gives no usable message
pub const GENERIC_ERROR_MESSAGE: &str = "The server could not complete the request. Please try again.";

/// API client error
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure (connection refused, timeout, TLS...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Server error {status}: {}", .message.as_deref().unwrap_or("no message"))]
    Status { status: u16, message: Option<String> },

    /// The body did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// The server answered 2xx but reported that the operation failed
    #[error("Request rejected: {}", .0.as_deref().unwrap_or("no message"))]
    Rejected(Option<String>),

    /// Reading a file to upload failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// HTTP status, when the server produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Text suitable for the error dialog
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Status { status: 413, .. } => {
                "The file is too large for the server. Choose a smaller file or compress it."
                    .to_string()
            }
            ApiError::Status { status: 415, .. } => {
                "This file type is not accepted. Upload a PDF, an image or a text document."
                    .to_string()
            }
            ApiError::Status {
                message: Some(message),
                ..
            }
            | ApiError::Rejected(Some(message)) => message.clone(),
            ApiError::Status { status, .. } => {
                format!("{GENERIC_ERROR_MESSAGE} (status {status})")
            }
            ApiError::Rejected(None) => GENERIC_ERROR_MESSAGE.to_string(),
            ApiError::Http(e) if e.is_timeout() => {
                "The server took too long to answer. Please try again.".to_string()
            }
            ApiError::Http(e) if e.is_connect() => {
                "Unable to reach the server. Check your connection.".to_string()
            }
            ApiError::Http(_) => GENERIC_ERROR_MESSAGE.to_string(),
            ApiError::MalformedResponse(detail) => {
                format!("The server sent an unexpected response: {detail}")
            }
            ApiError::Io(e) => format!("Could not read the file: {e}"),
        }
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_too_large_guidance() {
        let err = ApiError::Status {
            status: 413,
            message: Some("Request Entity Too Large".to_string()),
        };
        assert!(err.user_message().contains("too large"));
        assert_eq!(err.status(), Some(413));
    }

    #[test]
    fn test_unsupported_media_type_guidance() {
        let err = ApiError::Status {
            status: 415,
            message: None,
        };
        assert!(err.user_message().contains("file type"));
    }

    #[test]
    fn test_server_message_is_surfaced() {
        let err = ApiError::Status {
            status: 400,
            message: Some("Visite introuvable".to_string()),
        };
        assert_eq!(err.user_message(), "Visite introuvable");
    }

    #[test]
    fn test_generic_message_without_server_text() {
        let err = ApiError::Status {
            status: 500,
            message: None,
        };
        assert_eq!(
            err.user_message(),
            format!("{GENERIC_ERROR_MESSAGE} (status 500)")
        );
        assert_eq!(ApiError::Rejected(None).user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_display_includes_status() {
        let err = ApiError::Status {
            status: 404,
            message: None,
        };
        assert_eq!(err.to_string(), "Server error 404: no message");
    }

    #[test]
    fn test_malformed_response_is_descriptive() {
        let err = ApiError::MalformedResponse("expected an array of sections".to_string());
        assert!(err.user_message().contains("expected an array of sections"));
        assert!(err.status().is_none());
    }
}
