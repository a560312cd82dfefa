//! Error types for cron-job.org API operations
//!
//! Errors are categorized so callers can decide between retrying, dropping a
//! resource from state (404) or failing the operation.

use thiserror::Error;

/// Errors that can occur when talking to the cron-job.org API
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// The API answered with a status code >= 400
    #[error("API error {status}: {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the `error` or `message` field
        message: String,
        /// Raw response body
        body: String,
    },

    /// Network-related errors (connection issues, DNS failures)
    #[error("Network error: {message}")]
    Network {
        /// Error message
        message: String,
    },

    /// Request took longer than the configured timeout
    #[error("Request timeout after {seconds} seconds")]
    Timeout {
        /// Timeout duration in seconds
        seconds: u64,
    },

    /// Request or response body could not be (de)serialized
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// The client could not be built from its configuration
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },
}

impl ApiError {
    /// Returns true if this error is potentially retryable
    ///
    /// Rate limiting (429), connection failures and timeouts are transient;
    /// everything else needs user intervention.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Api { status, .. } => *status == 429,
            ApiError::Network { .. } | ApiError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Returns true if the API reported that the object does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::Api { status: 404, .. })
    }

    /// Returns true if this error indicates an authentication problem
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Api { status: 401 | 403, .. })
    }

    /// Returns the HTTP status code, if the error came from an API response
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Creates an API error
    pub fn api(status: u16, message: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            body: body.into(),
        }
    }

    /// Creates an API error from a status code and raw response body
    ///
    /// The message is taken from `{"error": ...}`, then `{"message": ...}`,
    /// and falls back to `Unknown error`.
    pub fn from_response(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = extract_error_message(&body).unwrap_or_else(|| "Unknown error".to_string());
        Self::api(status, message, body)
    }

    /// Creates a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates a timeout error
    pub fn timeout(seconds: u64) -> Self {
        Self::Timeout { seconds }
    }

    /// Creates a serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Creates a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

fn extract_error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error
        .filter(|e| !e.is_empty())
        .or(parsed.message.filter(|m| !m.is_empty()))
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::serialization(format!("Failed to decode response: {}", err))
        } else if err.is_connect() {
            Self::network(format!("Connection failed: {}", err))
        } else {
            Self::network(format!("Request failed: {}", err))
        }
    }
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;
