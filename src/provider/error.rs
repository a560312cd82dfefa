//! Error types for provider operations

use thiserror::Error;

use crate::client::ApiError;
use crate::schema::ValidationError;

/// Errors returned by resources, data sources and the provider itself
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The cron-job.org API rejected or failed a request
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Provider configuration is unusable
    #[error("{message}")]
    Config { message: String },

    /// An operation was attempted before `configure`
    #[error("Provider is not configured")]
    NotConfigured,

    /// The configuration failed schema validation
    #[error("Invalid configuration for {type_name}: {}", format_errors(.errors))]
    Validation {
        type_name: String,
        errors: Vec<ValidationError>,
    },

    /// An attribute was missing or held an unusable value
    #[error("Invalid attribute '{name}': {message}")]
    Attribute { name: String, message: String },

    #[error("Unknown {kind} type: {name}")]
    UnknownType { kind: &'static str, name: String },

    #[error("{type_name} does not support {operation}")]
    Unsupported {
        type_name: String,
        operation: &'static str,
    },
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ProviderError {
    pub fn config(message: impl Into<String>) -> Self {
        ProviderError::Config {
            message: message.into(),
        }
    }

    pub fn attribute(name: impl Into<String>, message: impl Into<String>) -> Self {
        ProviderError::Attribute {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a required attribute that is not set
    pub fn missing(name: impl Into<String>) -> Self {
        Self::attribute(name, "value is required")
    }

    /// Returns true if the API reported the object as missing
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::Api(e) if e.is_not_found())
    }
}

/// Result type for provider operations
pub type Result<T> = std::result::Result<T, ProviderError>;
