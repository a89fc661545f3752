//! Cloud facade error types

use thiserror::Error;

/// Errors surfaced by the cloud facade and its provider SDKs
#[derive(Error, Debug)]
pub enum CloudError {
    /// Missing or malformed configuration, detected before any network call
    #[error("{0}")]
    Validation(String),

    /// Adapter construction or identity resolution failed
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A required service endpoint is absent from the identity catalog
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The lifecycle poller exceeded its bound
    #[error("{0}")]
    Timeout(String),

    /// Any other provider-side failure
    #[error("{0}")]
    Provider(String),

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Operation not supported by {provider}: {operation}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Invalid state pattern: {0}")]
    Regex(#[from] regex::Error),
}

impl CloudError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came from the poller running out of time
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Fold transport failures into [`CloudError::Provider`]
    pub fn into_provider(self) -> Self {
        match self {
            Self::Http(err) => Self::Provider(err.to_string()),
            Self::Json(err) => Self::Provider(err.to_string()),
            Self::Io(err) => Self::Provider(err.to_string()),
            other => other,
        }
    }

    /// Reclassify a provider failure raised while authenticating
    pub(crate) fn into_authentication(self) -> Self {
        match self {
            Self::Provider(message) | Self::NotFound(message) => Self::Authentication(message),
            Self::Http(err) => Self::Authentication(err.to_string()),
            other => other,
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
