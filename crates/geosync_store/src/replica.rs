//! The replica handle.

use crate::backend::ReplicaBackend;
use crate::error::{StoreError, StoreResult};
use crate::manifest::ReplicaManifest;
use crate::store::ReplicaStore;
use geosync_model::{Envelope, LayerId, ReplicaId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Load lifecycle of a replica.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// No table has been opened yet.
    NotLoaded,
    /// Tables are being opened.
    Loading,
    /// Every requested table opened successfully.
    Loaded,
    /// Opening a table failed; the replica must not be used.
    FailedToLoad,
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoadStatus::NotLoaded => "not-loaded",
            LoadStatus::Loading => "loading",
            LoadStatus::Loaded => "loaded",
            LoadStatus::FailedToLoad => "failed-to-load",
        };
        write!(f, "{name}")
    }
}

/// A local replica of a scoped subset of a remote dataset.
///
/// Owns the [`ReplicaStore`] holding the tables plus the manifest
/// metadata (extent, layer set, per-layer server versions). Created by
/// replica generation, discarded by dropping the owning session; the
/// file lock on a [`FileBackend`](crate::FileBackend) releases on drop.
pub struct Replica {
    id: ReplicaId,
    extent: Envelope,
    layers: Vec<LayerId>,
    versions: RwLock<BTreeMap<LayerId, u64>>,
    status: RwLock<LoadStatus>,
    load_error: RwLock<Option<String>>,
    store: Arc<ReplicaStore>,
    backend: Arc<dyn ReplicaBackend>,
}

impl Replica {
    /// Creates a fresh replica over a backend, writing the manifest and
    /// creating one empty table per layer.
    ///
    /// The replica starts `NotLoaded`; populate the tables through
    /// [`store`](Self::store) and then call [`load`](Self::load).
    pub fn create(
        backend: Arc<dyn ReplicaBackend>,
        manifest: ReplicaManifest,
    ) -> StoreResult<Self> {
        backend.write_manifest(&manifest)?;
        let store = Arc::new(ReplicaStore::new(Arc::clone(&backend)));
        for layer_id in manifest.layer_ids() {
            store.create_layer(layer_id)?;
        }
        Ok(Self::from_manifest(backend, store, manifest))
    }

    /// Opens an existing replica from a backend's manifest.
    ///
    /// # Errors
    ///
    /// Returns a corruption error if the backend has no manifest.
    pub fn open(backend: Arc<dyn ReplicaBackend>) -> StoreResult<Self> {
        let manifest = backend
            .read_manifest()?
            .ok_or_else(|| StoreError::corrupted("replica has no manifest"))?;
        let store = Arc::new(ReplicaStore::new(Arc::clone(&backend)));
        Ok(Self::from_manifest(backend, store, manifest))
    }

    fn from_manifest(
        backend: Arc<dyn ReplicaBackend>,
        store: Arc<ReplicaStore>,
        manifest: ReplicaManifest,
    ) -> Self {
        let versions = manifest
            .layers
            .iter()
            .map(|entry| (entry.id, entry.version))
            .collect();
        Self {
            id: manifest.id,
            extent: manifest.extent,
            layers: manifest.layer_ids(),
            versions: RwLock::new(versions),
            status: RwLock::new(LoadStatus::NotLoaded),
            load_error: RwLock::new(None),
            store,
            backend,
        }
    }

    /// Opens every replicated table from the backend.
    ///
    /// On success the status becomes `Loaded`; on any failure it
    /// becomes `FailedToLoad` and the error is returned.
    pub fn load(&self) -> StoreResult<()> {
        *self.status.write() = LoadStatus::Loading;
        *self.load_error.write() = None;
        for &layer_id in &self.layers {
            if let Err(err) = self.store.load_layer(layer_id) {
                *self.status.write() = LoadStatus::FailedToLoad;
                *self.load_error.write() = Some(err.to_string());
                return Err(err);
            }
        }
        *self.status.write() = LoadStatus::Loaded;
        Ok(())
    }

    /// Returns the current load status.
    #[must_use]
    pub fn status(&self) -> LoadStatus {
        *self.status.read()
    }

    /// Returns the error message of the last failed load, if any.
    #[must_use]
    pub fn load_error(&self) -> Option<String> {
        self.load_error.read().clone()
    }

    /// Returns the replica identifier.
    #[must_use]
    pub fn id(&self) -> ReplicaId {
        self.id
    }

    /// Returns the extent the replica was generated for.
    #[must_use]
    pub fn extent(&self) -> Envelope {
        self.extent
    }

    /// Returns the replicated layers, in generation order.
    #[must_use]
    pub fn layer_ids(&self) -> &[LayerId] {
        &self.layers
    }

    /// Returns the feature tables.
    #[must_use]
    pub fn store(&self) -> &Arc<ReplicaStore> {
        &self.store
    }

    /// Returns the last server change version seen for a layer.
    #[must_use]
    pub fn version_of(&self, layer_id: LayerId) -> u64 {
        self.versions.read().get(&layer_id).copied().unwrap_or(0)
    }

    /// Records a new server change version for a layer and persists the
    /// updated manifest.
    pub fn set_version(&self, layer_id: LayerId, version: u64) -> StoreResult<()> {
        let mut versions = self.versions.write();
        versions.insert(layer_id, version);

        let mut manifest = ReplicaManifest::new(self.id, self.extent);
        for &layer in &self.layers {
            manifest.add_layer(layer, versions.get(&layer).copied().unwrap_or(0));
        }
        self.backend.write_manifest(&manifest)
    }
}

impl fmt::Debug for Replica {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Replica")
            .field("id", &self.id)
            .field("layers", &self.layers)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}
