//! Error types for the offline engine.

use thiserror::Error;

use geosync_service::ServiceError;
use geosync_store::StoreError;

use crate::state::{EditAction, EditState};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse failure classification, as carried on session error events.
///
/// `FeatureEditFailed` never appears inside an [`EngineError`]: a
/// rejected feature edit is reported per feature in the sync result
/// and does not fail the enclosing job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Generation parameter negotiation failed.
    NegotiationFailed,
    /// A feature transfer during generation failed.
    TransferFailed,
    /// A generated replica could not be loaded.
    LoadFailed,
    /// The sync exchange could not run.
    SyncTransportFailed,
    /// The service rejected a single uploaded edit.
    FeatureEditFailed,
    /// A call was made in a state that forbids it.
    InvalidStateTransition,
    /// Local replica storage failed.
    Storage,
    /// The job was cancelled.
    Cancelled,
    /// A job outcome was requested before the job finished.
    NotReady,
}

/// Errors produced by jobs and session calls.
///
/// The enum is `Clone` so a terminal job error can be handed to every
/// caller of [`JobHandle::result`](crate::JobHandle::result); wrapped
/// store and service errors are flattened to message strings at this
/// boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The service refused to negotiate generation parameters.
    #[error("parameter negotiation failed: {0}")]
    NegotiationFailed(String),

    /// A transfer leg of replica generation failed.
    #[error("feature transfer failed: {message}")]
    TransferFailed {
        /// Error message from the service.
        message: String,
        /// Whether the transfer can be retried.
        retryable: bool,
    },

    /// The generated replica did not load back from its backend.
    #[error("replica failed to load: {0}")]
    LoadFailed(String),

    /// The sync exchange could not run at all.
    ///
    /// Per-feature rejections are not transport failures; they come
    /// back inside the sync result.
    #[error("sync transport failed: {message}")]
    SyncTransportFailed {
        /// Error message from the service.
        message: String,
        /// Whether the sync can be retried.
        retryable: bool,
    },

    /// Local replica storage failed.
    #[error("replica storage failed: {0}")]
    Storage(String),

    /// A call was made in a state that forbids it.
    ///
    /// Always synchronous: it signals a caller bug, not a runtime
    /// condition, and is never emitted asynchronously by a job.
    #[error("cannot {action:?} in state {from:?}")]
    InvalidStateTransition {
        /// State the session was in.
        from: EditState,
        /// The rejected action.
        action: EditAction,
    },

    /// The job was cancelled before it finished.
    #[error("job cancelled")]
    Cancelled,

    /// Another job is already running on the session.
    #[error("another job is already active")]
    JobActive,

    /// The job has not reached a terminal status.
    #[error("job has not finished")]
    NotReady,
}

impl EngineError {
    /// Creates a negotiation failure.
    pub fn negotiation_failed(message: impl Into<String>) -> Self {
        Self::NegotiationFailed(message.into())
    }

    /// Creates a load failure.
    pub fn load_failed(message: impl Into<String>) -> Self {
        Self::LoadFailed(message.into())
    }

    /// Creates a non-retryable sync transport failure.
    pub fn sync_transport_fatal(message: impl Into<String>) -> Self {
        Self::SyncTransportFailed {
            message: message.into(),
            retryable: false,
        }
    }

    /// Wraps a service failure of the generate transfer leg.
    pub fn transfer(err: ServiceError) -> Self {
        Self::TransferFailed {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }

    /// Wraps a service failure of the sync exchange.
    pub fn sync_transport(err: ServiceError) -> Self {
        Self::SyncTransportFailed {
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }

    /// Returns true if retrying the operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::TransferFailed { retryable, .. }
            | EngineError::SyncTransportFailed { retryable, .. } => *retryable,
            _ => false,
        }
    }

    /// Returns the event classification of this error.
    ///
    /// `JobActive` reports as `InvalidStateTransition`; both reject a
    /// call the current session state forbids.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NegotiationFailed(_) => ErrorKind::NegotiationFailed,
            EngineError::TransferFailed { .. } => ErrorKind::TransferFailed,
            EngineError::LoadFailed(_) => ErrorKind::LoadFailed,
            EngineError::SyncTransportFailed { .. } => ErrorKind::SyncTransportFailed,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::InvalidStateTransition { .. } | EngineError::JobActive => {
                ErrorKind::InvalidStateTransition
            }
            EngineError::Cancelled => ErrorKind::Cancelled,
            EngineError::NotReady => ErrorKind::NotReady,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        EngineError::Storage(err.to_string())
    }
}
