//! Replica backend trait.

use crate::error::StoreResult;
use crate::manifest::ReplicaManifest;
use crate::record::FeatureRecord;
use geosync_model::LayerId;
use std::fmt::Debug;

/// Physical storage for a replica: a manifest plus one table per layer.
///
/// Backends are table stores, not byte stores - they persist whole
/// encoded tables and the manifest, and do not interpret features
/// beyond decoding them.
///
/// # Thread Safety
///
/// Backends must be `Send + Sync`; the store calls them under its own
/// table lock, so implementations only need internal consistency per
/// call.
pub trait ReplicaBackend: Send + Sync + Debug {
    /// Reads the manifest, or `None` for a freshly created replica.
    fn read_manifest(&self) -> StoreResult<Option<ReplicaManifest>>;

    /// Writes the manifest, replacing any previous one.
    fn write_manifest(&self, manifest: &ReplicaManifest) -> StoreResult<()>;

    /// Creates an empty table for the layer.
    ///
    /// Creating a table that already exists is a no-op.
    fn create_table(&self, layer_id: LayerId) -> StoreResult<()>;

    /// Reads all records of a layer table.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TableMissing`](crate::StoreError::TableMissing)
    /// if the table was never created, or
    /// [`StoreError::Corrupted`](crate::StoreError::Corrupted) if it
    /// cannot be decoded.
    fn read_table(&self, layer_id: LayerId) -> StoreResult<Vec<FeatureRecord>>;

    /// Replaces the contents of a layer table.
    fn write_table(&self, layer_id: LayerId, records: &[FeatureRecord]) -> StoreResult<()>;

    /// Returns the layers that have tables, in ascending order.
    fn table_ids(&self) -> StoreResult<Vec<LayerId>>;
}
