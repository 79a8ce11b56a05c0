//! Stored feature records.

use geosync_model::Feature;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whether a feature carries a local edit pending upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DirtyState {
    /// The feature matches the last synced server state.
    Clean,
    /// The feature was edited locally since the last successful sync.
    PendingUpdate,
}

impl fmt::Display for DirtyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirtyState::Clean => write!(f, "clean"),
            DirtyState::PendingUpdate => write!(f, "pending-update"),
        }
    }
}

/// A feature as stored in a replica table.
///
/// The revision counter increments on every local mutation. A sync job
/// snapshots (feature, revision) pairs at start and only clears the
/// dirty state of records whose revision has not moved since, so an
/// edit made while the sync is in flight is never lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    /// The feature data.
    pub feature: Feature,
    /// Dirty tracking state.
    pub state: DirtyState,
    /// Local mutation counter.
    pub revision: u64,
}

impl FeatureRecord {
    /// Creates a clean record at revision zero.
    #[must_use]
    pub fn clean(feature: Feature) -> Self {
        Self {
            feature,
            state: DirtyState::Clean,
            revision: 0,
        }
    }

    /// Returns true if the record carries a pending local edit.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.state == DirtyState::PendingUpdate
    }
}
