//! Feature selection and local edit commits.

use std::sync::Arc;

use tracing::debug;

use geosync_model::{AttributeValue, Envelope, FeatureId, Geometry, LayerId, Point};
use geosync_store::ReplicaStore;

use crate::error::EngineResult;

/// One selected feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectedFeature {
    /// Layer the feature lives in.
    pub layer_id: LayerId,
    /// The feature.
    pub feature_id: FeatureId,
}

/// The features the next commit will touch.
///
/// A selection is replaced by the next successful select and cleared
/// by the commit that consumes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    features: Vec<SelectedFeature>,
}

impl Selection {
    /// Number of selected features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// The selected features, in selection order.
    #[must_use]
    pub fn features(&self) -> &[SelectedFeature] {
        &self.features
    }
}

/// Applies selections and edit commits against a replica store.
///
/// The controller does not gate itself; the session checks the edit
/// state machine before calling in.
#[derive(Debug)]
pub struct EditController {
    store: Arc<ReplicaStore>,
    layers: Vec<LayerId>,
    selection: Selection,
}

impl EditController {
    /// Creates a controller over the given replica layers.
    #[must_use]
    pub fn new(store: Arc<ReplicaStore>, layers: Vec<LayerId>) -> Self {
        Self {
            store,
            layers,
            selection: Selection::default(),
        }
    }

    /// Current selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selects movable features within `tolerance` of `point`.
    ///
    /// Only point geometries are movable; lines and polygons near the
    /// point are ignored. With no match the previous selection stays
    /// in place. Returns the number of features now selected.
    pub fn select_near(&mut self, point: Point, tolerance: f64) -> EngineResult<usize> {
        let envelope = Envelope::around(point, tolerance);
        let mut found = Vec::new();
        for &layer_id in &self.layers {
            for feature in self.store.query(layer_id, &envelope)? {
                if feature.geometry.kind().is_movable() {
                    found.push(SelectedFeature {
                        layer_id,
                        feature_id: feature.id,
                    });
                }
            }
        }
        if found.is_empty() {
            return Ok(0);
        }
        debug!(selected = found.len(), "selection replaced");
        self.selection = Selection { features: found };
        Ok(self.selection.len())
    }

    /// Moves every selected feature to `point` and marks it pending.
    ///
    /// Each feature's geometry write and pending mark commit as a
    /// single store operation, so a download applied concurrently can
    /// never slip in between them. Clears the selection. Returns the
    /// number of features moved.
    pub fn move_selection_to(&mut self, point: Point) -> EngineResult<usize> {
        let mut moved = 0;
        for selected in self.selection.features() {
            let edited =
                self.store
                    .apply_local_edit(selected.layer_id, selected.feature_id, |feature| {
                        feature.geometry = Geometry::Point(point);
                    })?;
            if edited {
                moved += 1;
            }
        }
        self.selection = Selection::default();
        debug!(moved, "selection moved");
        Ok(moved)
    }

    /// Sets `name` to `value` on every selected feature and marks it
    /// pending, committing both as a single store operation.
    ///
    /// Clears the selection. Returns the number of features updated.
    pub fn update_selection_attribute(
        &mut self,
        name: &str,
        value: AttributeValue,
    ) -> EngineResult<usize> {
        let mut updated = 0;
        for selected in self.selection.features() {
            let edited =
                self.store
                    .apply_local_edit(selected.layer_id, selected.feature_id, |feature| {
                        feature.set_attribute(name, value.clone());
                    })?;
            if edited {
                updated += 1;
            }
        }
        self.selection = Selection::default();
        debug!(updated, attribute = name, "selection attribute updated");
        Ok(updated)
    }
}
