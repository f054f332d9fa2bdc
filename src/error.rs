//! Unified error model
//! Every failure the client surfaces is normalized into `ApiError` before
//! it reaches an endpoint module; raw transport errors never escape.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;

/// Field-level validation detail as returned by the backend envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Client error taxonomy.
///
/// `Clone` is required because a single refresh-token exchange can be
/// awaited by many callers, each of which receives the same failure.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// The request never reached the server, or no response came back.
    #[error("Network error: {0}")]
    Network(String),

    /// The request exceeded the configured deadline.
    #[error("Request timeout")]
    Timeout,

    /// The server rejected the credentials carried by a single request.
    #[error("Authentication failed")]
    Unauthorized,

    /// Terminal authentication failure: refresh failed or no refresh
    /// token existed. Local credentials have been cleared.
    #[error("Session expired")]
    SessionExpired,

    #[error("Access denied")]
    Forbidden,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Validation error: {message}")]
    Validation {
        status: u16,
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal client error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Classify a non-success HTTP response.
    ///
    /// `message` and `errors` come from the backend envelope when the body
    /// could be parsed; otherwise a fallback message is used.
    pub fn from_status(status: u16, message: Option<String>, errors: Vec<FieldError>) -> Self {
        match status {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(message.unwrap_or_else(|| "resource".to_string())),
            408 => ApiError::Timeout,
            429 => ApiError::RateLimitExceeded,
            400 | 409 | 422 => ApiError::Validation {
                status,
                message: message.unwrap_or_else(|| "Validation failed".to_string()),
                errors,
            },
            s if s >= 500 => ApiError::Server {
                status: s,
                message: message.unwrap_or_else(|| "Internal server error".to_string()),
            },
            s => ApiError::BadRequest(message.unwrap_or_else(|| format!("unexpected status {}", s))),
        }
    }

    /// HTTP status code associated with this error, where one exists.
    /// Pure transport failures report 0.
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Network(_) => 0,
            ApiError::Timeout => 408,
            ApiError::Unauthorized | ApiError::SessionExpired => 401,
            ApiError::Forbidden => 403,
            ApiError::NotFound(_) => 404,
            ApiError::BadRequest(_) => 400,
            ApiError::Validation { status, .. } => *status,
            ApiError::RateLimitExceeded => 429,
            ApiError::Server { status, .. } => *status,
            ApiError::Config(_) | ApiError::Internal(_) => 500,
        }
    }

    /// User-facing message without sensitive detail.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network(_) => "Network error. Please check your connection.".to_string(),
            ApiError::Timeout => "Request timeout".to_string(),
            ApiError::Unauthorized => "Authentication failed".to_string(),
            ApiError::SessionExpired => {
                "Your session has expired. Please log in again.".to_string()
            }
            ApiError::Forbidden => "Access denied".to_string(),
            ApiError::NotFound(msg) => format!("Resource not found: {}", msg),
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::RateLimitExceeded => "Too many requests".to_string(),
            ApiError::Server { .. } => "The server encountered an error".to_string(),
            ApiError::Config(_) => "Configuration error".to_string(),
            ApiError::Internal(_) => "An unexpected error occurred".to_string(),
        }
    }

    /// Field-level validation detail, when the server provided any.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    /// True for the two authentication-failure variants. Callers use this
    /// to decide whether a failure forces a logged-out transition.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, ApiError::Unauthorized | ApiError::SessionExpired)
    }

    /// True when retrying the same call later could plausibly succeed.
    /// This layer never retries on its own; the flag is for callers.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ApiError::Network(_) | ApiError::Timeout | ApiError::Server { .. }
        )
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ApiError::Timeout
        } else if e.is_connect() {
            ApiError::Network(format!("connection failed: {}", e))
        } else {
            ApiError::Network(e.to_string())
        }
    }
}

impl From<config::ConfigError> for ApiError {
    fn from(e: config::ConfigError) -> Self {
        ApiError::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(matches!(
            ApiError::from_status(401, None, vec![]),
            ApiError::Unauthorized
        ));
        assert!(matches!(
            ApiError::from_status(403, None, vec![]),
            ApiError::Forbidden
        ));
        assert!(matches!(
            ApiError::from_status(422, Some("bad field".into()), vec![]),
            ApiError::Validation { status: 422, .. }
        ));
        assert!(matches!(
            ApiError::from_status(503, None, vec![]),
            ApiError::Server { status: 503, .. }
        ));
    }

    #[test]
    fn test_validation_carries_field_errors() {
        let err = ApiError::from_status(
            400,
            Some("Validation failed".into()),
            vec![FieldError {
                field: "username".into(),
                message: "required".into(),
            }],
        );
        assert_eq!(err.field_errors().len(), 1);
        assert_eq!(err.field_errors()[0].field, "username");
    }

    #[test]
    fn test_user_message_no_sensitive_info() {
        let err = ApiError::Server {
            status: 500,
            message: "db password rejected at 10.0.0.5".into(),
        };
        assert!(!err.user_message().contains("10.0.0.5"));
    }

    #[test]
    fn test_auth_failure_detection() {
        assert!(ApiError::Unauthorized.is_auth_failure());
        assert!(ApiError::SessionExpired.is_auth_failure());
        assert!(!ApiError::Forbidden.is_auth_failure());
        assert!(!ApiError::Timeout.is_auth_failure());
    }

    #[test]
    fn test_retryable_classes() {
        assert!(ApiError::Timeout.is_retryable());
        assert!(ApiError::Network("down".into()).is_retryable());
        assert!(!ApiError::Validation {
            status: 400,
            message: "bad".into(),
            errors: vec![]
        }
        .is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), 401);
        assert_eq!(ApiError::SessionExpired.status_code(), 401);
        assert_eq!(ApiError::Timeout.status_code(), 408);
        assert_eq!(ApiError::Network("x".into()).status_code(), 0);
    }
}
