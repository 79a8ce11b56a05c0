//! Error types for feature service operations.

use geosync_model::LayerId;
use thiserror::Error;

/// Result type for feature service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors that can occur while talking to a feature service.
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// Network or transport error.
    #[error("network error: {message}")]
    Network {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The service rejected the credentials.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The request was malformed or referenced unknown data.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The requested layer does not exist on the service.
    #[error("layer {layer_id} not found on service")]
    LayerMissing {
        /// The unknown layer.
        layer_id: LayerId,
    },

    /// The service could not produce replica parameters.
    #[error("negotiation failed: {0}")]
    NegotiationFailed(String),
}

impl ServiceError {
    /// Creates a retryable network error.
    pub fn network_retryable(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable network error.
    pub fn network_fatal(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            retryable: false,
        }
    }

    /// Creates an invalid-request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Creates a negotiation-failed error.
    pub fn negotiation_failed(message: impl Into<String>) -> Self {
        Self::NegotiationFailed(message.into())
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Network { retryable, .. } => *retryable,
            _ => false,
        }
    }
}
