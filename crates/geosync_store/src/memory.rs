//! In-memory replica backend.

use crate::backend::ReplicaBackend;
use crate::error::{StoreError, StoreResult};
use crate::manifest::ReplicaManifest;
use crate::record::FeatureRecord;
use geosync_model::LayerId;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory replica backend.
///
/// Nothing survives the process; intended for tests and sessions that
/// never need the replica to outlive them.
///
/// # Thread Safety
///
/// This backend is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    manifest: RwLock<Option<ReplicaManifest>>,
    tables: RwLock<BTreeMap<LayerId, Vec<FeatureRecord>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReplicaBackend for MemoryBackend {
    fn read_manifest(&self) -> StoreResult<Option<ReplicaManifest>> {
        Ok(self.manifest.read().clone())
    }

    fn write_manifest(&self, manifest: &ReplicaManifest) -> StoreResult<()> {
        *self.manifest.write() = Some(manifest.clone());
        Ok(())
    }

    fn create_table(&self, layer_id: LayerId) -> StoreResult<()> {
        self.tables.write().entry(layer_id).or_default();
        Ok(())
    }

    fn read_table(&self, layer_id: LayerId) -> StoreResult<Vec<FeatureRecord>> {
        self.tables
            .read()
            .get(&layer_id)
            .cloned()
            .ok_or(StoreError::TableMissing { layer_id })
    }

    fn write_table(&self, layer_id: LayerId, records: &[FeatureRecord]) -> StoreResult<()> {
        self.tables.write().insert(layer_id, records.to_vec());
        Ok(())
    }

    fn table_ids(&self) -> StoreResult<Vec<LayerId>> {
        Ok(self.tables.read().keys().copied().collect())
    }
}
