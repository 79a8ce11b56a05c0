//! Per-feature edit outcomes.

use geosync_model::{FeatureId, LayerId};

/// A failure attached to one feature edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditFailure {
    /// Service error code.
    pub code: u32,
    /// Human-readable description.
    pub message: String,
}

impl EditFailure {
    /// Creates a failure with the given code and message.
    pub fn new(code: u32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for EditFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Outcome of applying one feature edit on the service.
///
/// With independent edits each result stands on its own: one failed
/// edit says nothing about its neighbors. A batch applied with
/// rollback produces a result per edit as well, every one carrying
/// the rollback failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureEditResult {
    /// The layer the edit targeted.
    pub layer_id: LayerId,
    /// The feature the edit targeted.
    pub feature_id: FeatureId,
    /// The failure, if the edit did not apply.
    pub error: Option<EditFailure>,
}

impl FeatureEditResult {
    /// Creates a successful result.
    pub fn success(layer_id: LayerId, feature_id: FeatureId) -> Self {
        Self {
            layer_id,
            feature_id,
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failure(layer_id: LayerId, feature_id: FeatureId, failure: EditFailure) -> Self {
        Self {
            layer_id,
            feature_id,
            error: Some(failure),
        }
    }

    /// Returns true if the edit applied.
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Returns true if any result in the batch carries a failure.
pub fn completed_with_errors(results: &[FeatureEditResult]) -> bool {
    results.iter().any(|r| !r.is_success())
}
