//! Error types for SubX client operations.
//!
//! Every failed API call surfaces as a [`SubxError`]. Non-2xx responses keep the
//! HTTP status code and the server-provided message so callers can decide on
//! their own retry policy; the client never retries.

use std::fmt;

/// Error codes for bridge and mobile integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SubxErrorCode {
    /// The API answered with a non-2xx status
    Api = 1000,
    /// Transport/network layer error
    Transport = 2000,
    /// Connection failed
    ConnectionFailed = 2001,
    /// Invalid request/config data
    InvalidData = 5000,
    /// Serialization error
    Serialization = 5002,
    /// Internal/unexpected error
    Internal = 9999,
}

/// Error type for SubX client operations.
#[derive(Debug)]
pub enum SubxError {
    /// The API rejected the request.
    Api {
        /// HTTP status code
        status: u16,
        /// Server-provided message, or the status text
        message: String,
    },

    /// Transport/network layer error.
    Transport(String),

    /// Connection failed.
    ConnectionFailed {
        /// Target base URL
        target: String,
        /// Underlying error message
        reason: String,
    },

    /// Invalid data provided.
    InvalidData {
        /// Field or parameter name
        field: String,
        /// Reason for invalidity
        reason: String,
    },

    /// Serialization/deserialization error.
    Serialization(String),

    /// Internal/unexpected error.
    Internal(String),
}

impl SubxError {
    /// Get the error code for bridge integration.
    pub fn code(&self) -> SubxErrorCode {
        match self {
            Self::Api { .. } => SubxErrorCode::Api,
            Self::Transport(_) => SubxErrorCode::Transport,
            Self::ConnectionFailed { .. } => SubxErrorCode::ConnectionFailed,
            Self::InvalidData { .. } => SubxErrorCode::InvalidData,
            Self::Serialization(_) => SubxErrorCode::Serialization,
            Self::Internal(_) => SubxErrorCode::Internal,
        }
    }

    /// HTTP status code of an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Get the error message as an owned String.
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    ///
    /// Only a hint for callers; the client itself never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::ConnectionFailed { .. } => true,
            Self::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// Returns true for a 404 from the API.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }

    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidData {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for SubxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api { status, message } => write!(f, "{} (status {})", message, status),
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::ConnectionFailed { target, reason } => {
                write!(f, "connection to {} failed: {}", target, reason)
            }
            Self::InvalidData { field, reason } => write!(f, "invalid {}: {}", field, reason),
            Self::Serialization(msg) => write!(f, "serialization error: {}", msg),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for SubxError {}

impl From<serde_json::Error> for SubxError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
