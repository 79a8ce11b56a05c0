//! An in-memory feature service for tests, demos and short-lived
//! sessions.

use crate::edits::{EditFailure, FeatureEditResult};
use crate::error::{ServiceError, ServiceResult};
use crate::page::{ChangePage, FeaturePage};
use crate::params::GenerateParameters;
use crate::service::FeatureService;
use geosync_model::{Envelope, Feature, FeatureId, LayerId, LayerInfo};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// A feature with the change version it was last written at.
#[derive(Debug, Clone)]
struct StoredFeature {
    feature: Feature,
    version: u64,
}

#[derive(Debug)]
struct LayerTable {
    info: LayerInfo,
    features: BTreeMap<FeatureId, StoredFeature>,
}

/// A [`FeatureService`] held entirely in memory.
///
/// Change versions work like an operation log cursor: every applied
/// write bumps a service-wide counter and stamps the feature, so
/// [`changes_since`](FeatureService::changes_since) can replay writes
/// in order.
///
/// Failure injection mirrors what a real service can do to a client:
/// [`set_offline`](Self::set_offline) fails every call with a
/// retryable network error, [`reject_edits_for`](Self::reject_edits_for)
/// makes a single feature's edits fail per-feature, and
/// [`fail_negotiation`](Self::fail_negotiation) refuses to produce
/// generation parameters.
pub struct MemoryFeatureService {
    layers: RwLock<BTreeMap<LayerId, LayerTable>>,
    /// Service-wide change version, bumped once per applied write.
    version: RwLock<u64>,
    offline: AtomicBool,
    rejected: Mutex<BTreeSet<(LayerId, FeatureId)>>,
    negotiation_failure: Mutex<Option<String>>,
}

impl MemoryFeatureService {
    /// Error code attached to an edit the service rejected.
    pub const EDIT_REJECTED: u32 = 1000;

    /// Error code attached to edits discarded because a sibling in the
    /// same rollback batch failed.
    pub const ROLLED_BACK: u32 = 1001;

    /// Creates an empty service with no layers.
    pub fn new() -> Self {
        Self {
            layers: RwLock::new(BTreeMap::new()),
            version: RwLock::new(0),
            offline: AtomicBool::new(false),
            rejected: Mutex::new(BTreeSet::new()),
            negotiation_failure: Mutex::new(None),
        }
    }

    /// Publishes a new empty layer. Replaces any layer with the same ID.
    pub fn add_layer(&self, info: LayerInfo) {
        let mut layers = self.layers.write();
        layers.insert(
            info.id,
            LayerTable {
                info,
                features: BTreeMap::new(),
            },
        );
    }

    /// Writes a feature directly into a layer, stamping it with a
    /// fresh change version.
    ///
    /// This is the server-side write path: after a client generated a
    /// replica, seeding simulates another user's edit arriving on the
    /// service.
    pub fn seed(&self, layer_id: LayerId, feature: Feature) -> ServiceResult<()> {
        let mut layers = self.layers.write();
        let table = layers
            .get_mut(&layer_id)
            .ok_or(ServiceError::LayerMissing { layer_id })?;
        let mut version = self.version.write();
        *version += 1;
        table.features.insert(
            feature.id,
            StoredFeature {
                feature,
                version: *version,
            },
        );
        Ok(())
    }

    /// Returns a feature as the service currently holds it.
    pub fn feature(&self, layer_id: LayerId, feature_id: FeatureId) -> Option<Feature> {
        let layers = self.layers.read();
        layers
            .get(&layer_id)
            .and_then(|table| table.features.get(&feature_id))
            .map(|stored| stored.feature.clone())
    }

    /// Returns the current service-wide change version.
    pub fn version(&self) -> u64 {
        *self.version.read()
    }

    /// Sets whether the service is reachable. While offline, every
    /// call fails with a retryable network error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes every future edit of the given feature fail.
    pub fn reject_edits_for(&self, layer_id: LayerId, feature_id: FeatureId) {
        self.rejected.lock().insert((layer_id, feature_id));
    }

    /// Removes all edit rejections.
    pub fn clear_rejections(&self) {
        self.rejected.lock().clear();
    }

    /// Makes parameter negotiation fail with the given message.
    pub fn fail_negotiation(&self, message: impl Into<String>) {
        *self.negotiation_failure.lock() = Some(message.into());
    }

    fn ensure_online(&self) -> ServiceResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(ServiceError::network_retryable("service offline"));
        }
        Ok(())
    }
}

impl Default for MemoryFeatureService {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureService for MemoryFeatureService {
    fn layers(&self) -> ServiceResult<Vec<LayerInfo>> {
        self.ensure_online()?;
        let layers = self.layers.read();
        Ok(layers.values().map(|table| table.info.clone()).collect())
    }

    fn default_generate_parameters(&self, extent: Envelope) -> ServiceResult<GenerateParameters> {
        self.ensure_online()?;
        if let Some(message) = self.negotiation_failure.lock().clone() {
            return Err(ServiceError::NegotiationFailed(message));
        }
        let layer_ids: Vec<LayerId> = self.layers.read().keys().copied().collect();
        Ok(GenerateParameters::new(extent).with_layers(layer_ids))
    }

    fn extract(
        &self,
        layer_id: LayerId,
        extent: &Envelope,
        cursor: u64,
        limit: u32,
    ) -> ServiceResult<FeaturePage> {
        self.ensure_online()?;
        let layers = self.layers.read();
        let table = layers
            .get(&layer_id)
            .ok_or(ServiceError::LayerMissing { layer_id })?;

        let matching: Vec<&StoredFeature> = table
            .features
            .values()
            .filter(|stored| stored.feature.geometry.intersects(extent))
            .collect();

        let start = (cursor as usize).min(matching.len());
        let end = start.saturating_add(limit as usize).min(matching.len());
        let features = matching[start..end]
            .iter()
            .map(|stored| stored.feature.clone())
            .collect();

        Ok(FeaturePage::new(
            features,
            end as u64,
            end < matching.len(),
            *self.version.read(),
        ))
    }

    fn apply_edits(
        &self,
        layer_id: LayerId,
        edits: &[Feature],
        rollback_on_failure: bool,
    ) -> ServiceResult<Vec<FeatureEditResult>> {
        self.ensure_online()?;
        let mut layers = self.layers.write();
        let table = layers
            .get_mut(&layer_id)
            .ok_or(ServiceError::LayerMissing { layer_id })?;
        let rejected = self.rejected.lock();

        let batch_failed = rollback_on_failure
            && edits
                .iter()
                .any(|feature| rejected.contains(&(layer_id, feature.id)));
        if batch_failed {
            // Nothing applies; every entry reports why.
            return Ok(edits
                .iter()
                .map(|feature| {
                    let failure = if rejected.contains(&(layer_id, feature.id)) {
                        EditFailure::new(Self::EDIT_REJECTED, "edit rejected by service")
                    } else {
                        EditFailure::new(Self::ROLLED_BACK, "rolled back with failed batch")
                    };
                    FeatureEditResult::failure(layer_id, feature.id, failure)
                })
                .collect());
        }

        let mut version = self.version.write();
        let mut results = Vec::with_capacity(edits.len());
        for feature in edits {
            if rejected.contains(&(layer_id, feature.id)) {
                results.push(FeatureEditResult::failure(
                    layer_id,
                    feature.id,
                    EditFailure::new(Self::EDIT_REJECTED, "edit rejected by service"),
                ));
                continue;
            }
            *version += 1;
            table.features.insert(
                feature.id,
                StoredFeature {
                    feature: feature.clone(),
                    version: *version,
                },
            );
            results.push(FeatureEditResult::success(layer_id, feature.id));
        }
        Ok(results)
    }

    fn changes_since(
        &self,
        layer_id: LayerId,
        since: u64,
        limit: u32,
    ) -> ServiceResult<ChangePage> {
        self.ensure_online()?;
        let layers = self.layers.read();
        let table = layers
            .get(&layer_id)
            .ok_or(ServiceError::LayerMissing { layer_id })?;

        let mut changed: Vec<&StoredFeature> = table
            .features
            .values()
            .filter(|stored| stored.version > since)
            .collect();
        changed.sort_by_key(|stored| stored.version);

        let has_more = changed.len() > limit as usize;
        let page: Vec<&StoredFeature> = changed.into_iter().take(limit as usize).collect();
        // A full page resumes from its last change; a final page jumps
        // to the current service version.
        let version = if has_more {
            page.last().map(|stored| stored.version).unwrap_or(since)
        } else {
            *self.version.read()
        };

        Ok(ChangePage::new(
            page.iter().map(|stored| stored.feature.clone()).collect(),
            version,
            has_more,
        ))
    }

    fn query(&self, layer_id: LayerId, filter: &Envelope) -> ServiceResult<Vec<Feature>> {
        self.ensure_online()?;
        let layers = self.layers.read();
        let table = layers
            .get(&layer_id)
            .ok_or(ServiceError::LayerMissing { layer_id })?;
        Ok(table
            .features
            .values()
            .filter(|stored| stored.feature.geometry.intersects(filter))
            .map(|stored| stored.feature.clone())
            .collect())
    }
}

impl fmt::Debug for MemoryFeatureService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryFeatureService")
            .field("layers", &self.layers.read().len())
            .field("version", &*self.version.read())
            .finish_non_exhaustive()
    }
}
