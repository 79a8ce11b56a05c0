//! Replica feature tables with dirty tracking.

use crate::backend::ReplicaBackend;
use crate::error::{StoreError, StoreResult};
use crate::record::{DirtyState, FeatureRecord};
use geosync_model::{Envelope, Feature, FeatureId, LayerId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A dirty feature captured at sync start.
///
/// The revision pins the edit the sync is about to upload; clearing is
/// refused later if the record has moved past it.
#[derive(Debug, Clone)]
pub struct DirtySnapshot {
    /// Layer the feature belongs to.
    pub layer_id: LayerId,
    /// The feature as it was at snapshot time.
    pub feature: Feature,
    /// Record revision at snapshot time.
    pub revision: u64,
}

/// Outcome of applying a downloaded change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteApply {
    /// The change was written to the table.
    Applied,
    /// The local record has a pending edit; the download was dropped
    /// (local wins until the edit has been uploaded).
    SkippedDirty,
}

/// The local feature tables of one replica.
///
/// Tables live in memory and every mutation is written through to the
/// backend before the call returns, so dirty state survives restarts.
///
/// # Thread Safety
///
/// All operations take the internal table lock; concurrent edits and a
/// running sync job serialize per call. The sync job's consistency over
/// multiple calls comes from [`snapshot_dirty`](Self::snapshot_dirty) +
/// [`clear_dirty`](Self::clear_dirty) revisions, not from holding a
/// lock across the job.
pub struct ReplicaStore {
    backend: Arc<dyn ReplicaBackend>,
    tables: RwLock<BTreeMap<LayerId, Table>>,
}

#[derive(Default)]
struct Table {
    records: BTreeMap<FeatureId, FeatureRecord>,
}

impl Table {
    fn to_records(&self) -> Vec<FeatureRecord> {
        self.records.values().cloned().collect()
    }

    fn from_records(records: Vec<FeatureRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.feature.id, record))
                .collect(),
        }
    }
}

impl ReplicaStore {
    /// Creates a store over a backend with no tables loaded.
    #[must_use]
    pub fn new(backend: Arc<dyn ReplicaBackend>) -> Self {
        Self {
            backend,
            tables: RwLock::new(BTreeMap::new()),
        }
    }

    /// Creates an empty table for the layer, in memory and in the
    /// backend. Creating an existing layer is a no-op.
    pub fn create_layer(&self, layer_id: LayerId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        tables.entry(layer_id).or_default();
        self.backend.create_table(layer_id)
    }

    /// Loads (or reloads) a layer table from the backend.
    ///
    /// Returns the number of records loaded.
    pub fn load_layer(&self, layer_id: LayerId) -> StoreResult<usize> {
        let records = self.backend.read_table(layer_id)?;
        let count = records.len();
        self.tables
            .write()
            .insert(layer_id, Table::from_records(records));
        Ok(count)
    }

    /// Returns the layers currently present in memory, ascending.
    #[must_use]
    pub fn loaded_layers(&self) -> Vec<LayerId> {
        self.tables.read().keys().copied().collect()
    }

    /// Inserts or replaces a feature, resetting it to `Clean`.
    ///
    /// Callers recording a local edit follow up with
    /// [`mark_dirty`](Self::mark_dirty).
    pub fn put(&self, layer_id: LayerId, feature: Feature) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Self::upsert_clean(table, feature);
        self.backend.write_table(layer_id, &table.to_records())
    }

    /// Bulk variant of [`put`](Self::put): one write-through for the
    /// whole batch. Returns the number of features written.
    pub fn put_many(&self, layer_id: LayerId, features: Vec<Feature>) -> StoreResult<usize> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        let count = features.len();
        for feature in features {
            Self::upsert_clean(table, feature);
        }
        self.backend.write_table(layer_id, &table.to_records())?;
        Ok(count)
    }

    /// Returns a feature by ID, or `None` if it is not in the table.
    pub fn get(&self, layer_id: LayerId, feature_id: FeatureId) -> StoreResult<Option<Feature>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table
            .records
            .get(&feature_id)
            .map(|record| record.feature.clone()))
    }

    /// Returns the dirty state of a feature, or `None` if absent.
    pub fn dirty_state(
        &self,
        layer_id: LayerId,
        feature_id: FeatureId,
    ) -> StoreResult<Option<DirtyState>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table.records.get(&feature_id).map(|record| record.state))
    }

    /// Returns the revision counter of a feature, or `None` if absent.
    pub fn revision_of(
        &self,
        layer_id: LayerId,
        feature_id: FeatureId,
    ) -> StoreResult<Option<u64>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table.records.get(&feature_id).map(|record| record.revision))
    }

    /// Marks a feature as carrying a pending local edit.
    ///
    /// Idempotent: marking an already-dirty feature changes nothing.
    pub fn mark_dirty(&self, layer_id: LayerId, feature_id: FeatureId) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        let record = table
            .records
            .get_mut(&feature_id)
            .ok_or(StoreError::FeatureMissing {
                layer_id,
                feature_id,
            })?;

        if record.is_dirty() {
            return Ok(());
        }
        record.state = DirtyState::PendingUpdate;
        record.revision += 1;
        self.backend.write_table(layer_id, &table.to_records())
    }

    /// Mutates a feature in place and marks it pending, in one step.
    ///
    /// The whole commit happens under one table guard; a concurrent
    /// [`apply_remote`](Self::apply_remote) sees either the record
    /// before the edit or the finished pending record, never a clean
    /// record carrying a half-committed edit. Returns true if the
    /// feature existed and was edited.
    pub fn apply_local_edit(
        &self,
        layer_id: LayerId,
        feature_id: FeatureId,
        mutate: impl FnOnce(&mut Feature),
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        let Some(record) = table.records.get_mut(&feature_id) else {
            return Ok(false);
        };
        mutate(&mut record.feature);
        record.state = DirtyState::PendingUpdate;
        record.revision += 1;
        self.backend.write_table(layer_id, &table.to_records())?;
        Ok(true)
    }

    /// Returns the dirty features of a layer, in feature-ID order.
    pub fn dirty_features(&self, layer_id: LayerId) -> StoreResult<Vec<Feature>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table
            .records
            .values()
            .filter(|record| record.is_dirty())
            .map(|record| record.feature.clone())
            .collect())
    }

    /// Returns the number of dirty features in a layer.
    pub fn dirty_count(&self, layer_id: LayerId) -> StoreResult<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table.records.values().filter(|r| r.is_dirty()).count())
    }

    /// Returns true if any loaded layer has a dirty feature.
    #[must_use]
    pub fn has_local_edits(&self) -> bool {
        self.tables
            .read()
            .values()
            .any(|table| table.records.values().any(|r| r.is_dirty()))
    }

    /// Returns every feature of a layer, in feature-ID order.
    pub fn features(&self, layer_id: LayerId) -> StoreResult<Vec<Feature>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table
            .records
            .values()
            .map(|record| record.feature.clone())
            .collect())
    }

    /// Returns the number of features in a layer.
    pub fn feature_count(&self, layer_id: LayerId) -> StoreResult<usize> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table.records.len())
    }

    /// Returns the features of a layer whose geometry falls inside the
    /// envelope (any vertex, for multi-point shapes).
    pub fn query(&self, layer_id: LayerId, envelope: &Envelope) -> StoreResult<Vec<Feature>> {
        let tables = self.tables.read();
        let table = tables
            .get(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        Ok(table
            .records
            .values()
            .filter(|record| record.feature.geometry.intersects(envelope))
            .map(|record| record.feature.clone())
            .collect())
    }

    /// Captures every dirty feature of the given layers, with its
    /// revision, under a single read lock.
    ///
    /// Layer order in the result follows the order given; features are
    /// in ID order within each layer.
    pub fn snapshot_dirty(&self, layers: &[LayerId]) -> StoreResult<Vec<DirtySnapshot>> {
        let tables = self.tables.read();
        let mut snapshot = Vec::new();
        for &layer_id in layers {
            let table = tables
                .get(&layer_id)
                .ok_or(StoreError::TableMissing { layer_id })?;
            for record in table.records.values().filter(|r| r.is_dirty()) {
                snapshot.push(DirtySnapshot {
                    layer_id,
                    feature: record.feature.clone(),
                    revision: record.revision,
                });
            }
        }
        Ok(snapshot)
    }

    /// Clears the dirty flag of a feature, but only if its revision
    /// still matches the snapshot the sync was taken from.
    ///
    /// Returns true if the flag was cleared. A feature edited again
    /// mid-sync keeps its pending state for the next sync.
    pub fn clear_dirty(
        &self,
        layer_id: LayerId,
        feature_id: FeatureId,
        revision: u64,
    ) -> StoreResult<bool> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;
        let Some(record) = table.records.get_mut(&feature_id) else {
            return Ok(false);
        };
        if !record.is_dirty() || record.revision != revision {
            return Ok(false);
        }
        record.state = DirtyState::Clean;
        self.backend.write_table(layer_id, &table.to_records())?;
        Ok(true)
    }

    /// Applies a downloaded remote change.
    ///
    /// A record with a pending local edit is left untouched and the
    /// change is dropped; everything else is upserted as `Clean`.
    pub fn apply_remote(&self, layer_id: LayerId, feature: Feature) -> StoreResult<RemoteApply> {
        let mut tables = self.tables.write();
        let table = tables
            .get_mut(&layer_id)
            .ok_or(StoreError::TableMissing { layer_id })?;

        if let Some(record) = table.records.get(&feature.id) {
            if record.is_dirty() {
                return Ok(RemoteApply::SkippedDirty);
            }
        }
        Self::upsert_clean(table, feature);
        self.backend.write_table(layer_id, &table.to_records())?;
        Ok(RemoteApply::Applied)
    }

    fn upsert_clean(table: &mut Table, feature: Feature) {
        match table.records.get_mut(&feature.id) {
            Some(record) => {
                record.feature = feature;
                record.state = DirtyState::Clean;
                record.revision += 1;
            }
            None => {
                table
                    .records
                    .insert(feature.id, FeatureRecord::clean(feature));
            }
        }
    }
}

impl fmt::Debug for ReplicaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplicaStore")
            .field("layers", &self.tables.read().len())
            .finish_non_exhaustive()
    }
}
