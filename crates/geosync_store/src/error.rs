//! Error types for replica storage.

use geosync_model::{FeatureId, LayerId};
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during replica storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The replica directory is locked by another process.
    #[error("replica directory is locked by another process")]
    ReplicaLocked,

    /// Stored replica data could not be decoded.
    #[error("replica data corrupted: {0}")]
    Corrupted(String),

    /// Replica data could not be encoded for storage.
    #[error("encode error: {0}")]
    Encode(String),

    /// No table exists for the given layer.
    #[error("no table for {layer_id}")]
    TableMissing {
        /// The layer whose table was requested.
        layer_id: LayerId,
    },

    /// The feature does not exist in the given table.
    #[error("no feature {feature_id} in {layer_id}")]
    FeatureMissing {
        /// The layer that was searched.
        layer_id: LayerId,
        /// The missing feature.
        feature_id: FeatureId,
    },
}

impl StoreError {
    /// Creates a corruption error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates an encode error.
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Creates a missing-table error.
    #[must_use]
    pub fn table_missing(layer_id: LayerId) -> Self {
        Self::TableMissing { layer_id }
    }

    /// Creates a missing-feature error.
    #[must_use]
    pub fn feature_missing(layer_id: LayerId, feature_id: FeatureId) -> Self {
        Self::FeatureMissing {
            layer_id,
            feature_id,
        }
    }
}
