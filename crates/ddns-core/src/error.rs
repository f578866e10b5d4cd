//! Error types for the DDNS reconciler
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing keys, malformed file, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Transport failures: DNS resolution, connection refused, timeout,
    /// or a request that could not be built
    #[error("Transport error: {0}")]
    Transport(String),

    /// A request completed with an unexpected HTTP status
    #[error("HTTP error: {status}: {body}")]
    Http {
        /// Status code returned by the server
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An expected field was absent (or empty) in a response payload
    #[error("Field not found in response: {field}")]
    FieldNotFound {
        /// Name of the missing field
        field: String,
    },

    /// The registrar refused a record update
    #[error("Record update rejected with status {status}: {body}")]
    WriteRejected {
        /// Status code returned by the registrar
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an HTTP status error
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create a "field not found" error
    pub fn field_not_found(field: impl Into<String>) -> Self {
        Self::FieldNotFound {
            field: field.into(),
        }
    }

    /// Create a write-rejected error
    pub fn write_rejected(status: u16, body: impl Into<String>) -> Self {
        Self::WriteRejected {
            status,
            body: body.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Config(err.to_string())
    }
}
