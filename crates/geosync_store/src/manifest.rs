//! Replica manifest.

use geosync_model::{Envelope, LayerId, ReplicaId};
use serde::{Deserialize, Serialize};

/// One replicated layer and its server change version.
///
/// The version is the service's change watermark at the time the layer
/// was last extracted or downloaded; the sync download leg asks for
/// changes after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// The layer identifier.
    pub id: LayerId,
    /// Server change version last seen for this layer.
    pub version: u64,
}

/// Persistent metadata describing a replica.
///
/// Stored at the root of the replica directory; layer order is the
/// order requested at generation time and is preserved across loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicaManifest {
    /// Unique replica identifier.
    pub id: ReplicaId,
    /// The extent the replica was scoped to.
    pub extent: Envelope,
    /// Replicated layers, in generation order.
    pub layers: Vec<LayerEntry>,
}

impl ReplicaManifest {
    /// Creates a manifest with no layers.
    #[must_use]
    pub fn new(id: ReplicaId, extent: Envelope) -> Self {
        Self {
            id,
            extent,
            layers: Vec::new(),
        }
    }

    /// Appends a layer entry.
    pub fn add_layer(&mut self, id: LayerId, version: u64) {
        self.layers.push(LayerEntry { id, version });
    }

    /// Returns the layer identifiers in manifest order.
    #[must_use]
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layers.iter().map(|entry| entry.id).collect()
    }

    /// Returns the stored version for a layer, or zero if unknown.
    #[must_use]
    pub fn version_of(&self, layer_id: LayerId) -> u64 {
        self.layers
            .iter()
            .find(|entry| entry.id == layer_id)
            .map(|entry| entry.version)
            .unwrap_or(0)
    }

    /// Updates the stored version for a layer.
    ///
    /// Unknown layers are ignored; versions only exist for layers the
    /// replica was generated with.
    pub fn set_version(&mut self, layer_id: LayerId, version: u64) {
        if let Some(entry) = self.layers.iter_mut().find(|entry| entry.id == layer_id) {
            entry.version = version;
        }
    }
}
