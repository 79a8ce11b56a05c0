//! The remote feature service abstraction.

use crate::edits::FeatureEditResult;
use crate::error::{ServiceError, ServiceResult};
use crate::page::{ChangePage, FeaturePage};
use crate::params::GenerateParameters;
use geosync_model::{Envelope, Feature, LayerId, LayerInfo};

/// A remote store of geospatial features.
///
/// This trait abstracts the network side of replica generation and
/// synchronization, allowing for different implementations (HTTP,
/// in-memory for testing, etc.). Every call is synchronous from the
/// caller's point of view; long-running flows wrap calls in jobs a
/// layer up.
pub trait FeatureService: Send + Sync {
    /// Returns the layers the service publishes, in service order.
    fn layers(&self) -> ServiceResult<Vec<LayerInfo>>;

    /// Negotiates default replica generation parameters for an area
    /// of interest. The returned parameters cover every published
    /// layer; callers narrow them before generating.
    fn default_generate_parameters(&self, extent: Envelope) -> ServiceResult<GenerateParameters>;

    /// Extracts one page of a layer's features inside an extent.
    ///
    /// Pass `cursor` 0 for the first page and the returned cursor for
    /// each following page until `has_more` is false.
    fn extract(
        &self,
        layer_id: LayerId,
        extent: &Envelope,
        cursor: u64,
        limit: u32,
    ) -> ServiceResult<FeaturePage>;

    /// Applies a batch of feature upserts to a layer.
    ///
    /// With `rollback_on_failure` false, each edit succeeds or fails
    /// on its own. With it true, one failure discards the whole batch
    /// and every result carries an error.
    fn apply_edits(
        &self,
        layer_id: LayerId,
        edits: &[Feature],
        rollback_on_failure: bool,
    ) -> ServiceResult<Vec<FeatureEditResult>>;

    /// Returns one page of a layer's changes since a known version,
    /// oldest first.
    fn changes_since(&self, layer_id: LayerId, since: u64, limit: u32)
        -> ServiceResult<ChangePage>;

    /// Returns the features of a layer intersecting a spatial filter.
    fn query(&self, layer_id: LayerId, filter: &Envelope) -> ServiceResult<Vec<Feature>>;

    /// Applies a single feature upsert. Convenience over
    /// [`apply_edits`](Self::apply_edits) with independent edits.
    fn update_feature(
        &self,
        layer_id: LayerId,
        feature: &Feature,
    ) -> ServiceResult<FeatureEditResult> {
        let mut results = self.apply_edits(layer_id, std::slice::from_ref(feature), false)?;
        results
            .pop()
            .ok_or_else(|| ServiceError::invalid_request("service returned no edit result"))
    }
}
