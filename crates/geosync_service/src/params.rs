//! Parameter types for replica generation and synchronization.

use geosync_model::{Envelope, LayerId, SpatialReference};

/// Parameters controlling replica generation.
///
/// A default set is negotiated from the service via
/// [`FeatureService::default_generate_parameters`](crate::FeatureService::default_generate_parameters)
/// and then narrowed by the caller (extent, layer selection).
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateParameters {
    /// Area of interest. Only features intersecting this envelope
    /// are downloaded into the replica.
    pub extent: Envelope,
    /// Layers included in the replica, in service order.
    pub layer_ids: Vec<LayerId>,
    /// Whether feature attachments are downloaded alongside features.
    pub include_attachments: bool,
    /// Spatial reference of the downloaded geometries.
    pub spatial_reference: SpatialReference,
}

impl GenerateParameters {
    /// Creates parameters for the given area of interest covering no layers.
    pub fn new(extent: Envelope) -> Self {
        Self {
            extent,
            layer_ids: Vec::new(),
            include_attachments: false,
            spatial_reference: SpatialReference::WGS84,
        }
    }

    /// Sets the layers to include.
    pub fn with_layers(mut self, layer_ids: Vec<LayerId>) -> Self {
        self.layer_ids = layer_ids;
        self
    }

    /// Sets whether attachments are downloaded.
    pub fn with_attachments(mut self, include: bool) -> Self {
        self.include_attachments = include;
        self
    }

    /// Sets the output spatial reference.
    pub fn with_spatial_reference(mut self, sr: SpatialReference) -> Self {
        self.spatial_reference = sr;
        self
    }
}

/// Direction of a synchronization pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncDirection {
    /// Upload local edits, then download remote changes.
    Bidirectional,
    /// Upload local edits only.
    Upload,
    /// Download remote changes only.
    Download,
}

impl SyncDirection {
    /// Returns true if this direction includes the upload leg.
    #[must_use]
    pub fn uploads(self) -> bool {
        matches!(self, SyncDirection::Bidirectional | SyncDirection::Upload)
    }

    /// Returns true if this direction includes the download leg.
    #[must_use]
    pub fn downloads(self) -> bool {
        matches!(self, SyncDirection::Bidirectional | SyncDirection::Download)
    }
}

impl std::fmt::Display for SyncDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncDirection::Bidirectional => write!(f, "bidirectional"),
            SyncDirection::Upload => write!(f, "upload"),
            SyncDirection::Download => write!(f, "download"),
        }
    }
}

/// Per-layer sync participation.
///
/// Layers without an option are skipped by the sync pass. Options are
/// honored in order, which fixes the upload order of layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncLayerOption {
    /// The participating layer.
    pub layer_id: LayerId,
}

impl SyncLayerOption {
    /// Creates an option for the given layer.
    pub fn new(layer_id: LayerId) -> Self {
        Self { layer_id }
    }
}

/// Parameters controlling a synchronization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncParameters {
    /// Which way data flows.
    pub direction: SyncDirection,
    /// When true, a failed edit rolls back the whole batch on the
    /// service. When false, each edit succeeds or fails independently.
    pub rollback_on_failure: bool,
    /// Layers participating in this pass, in upload order.
    pub layer_options: Vec<SyncLayerOption>,
}

impl SyncParameters {
    /// Creates bidirectional parameters with independent edits and no layers.
    pub fn new() -> Self {
        Self {
            direction: SyncDirection::Bidirectional,
            rollback_on_failure: false,
            layer_options: Vec::new(),
        }
    }

    /// Creates bidirectional parameters covering the given layers.
    pub fn for_layers(layer_ids: impl IntoIterator<Item = LayerId>) -> Self {
        Self::new().with_layers(layer_ids)
    }

    /// Sets the sync direction.
    pub fn with_direction(mut self, direction: SyncDirection) -> Self {
        self.direction = direction;
        self
    }

    /// Sets the rollback behavior.
    pub fn with_rollback_on_failure(mut self, rollback: bool) -> Self {
        self.rollback_on_failure = rollback;
        self
    }

    /// Replaces the participating layers.
    pub fn with_layers(mut self, layer_ids: impl IntoIterator<Item = LayerId>) -> Self {
        self.layer_options = layer_ids.into_iter().map(SyncLayerOption::new).collect();
        self
    }

    /// Returns the participating layer IDs in upload order.
    pub fn layer_ids(&self) -> Vec<LayerId> {
        self.layer_options.iter().map(|o| o.layer_id).collect()
    }
}

impl Default for SyncParameters {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geosync_model::Point;

    #[test]
    fn generate_parameters_builder() {
        let extent = Envelope::around(Point::new(10.0, 20.0), 5.0);
        let params = GenerateParameters::new(extent)
            .with_layers(vec![LayerId::new(0), LayerId::new(1)])
            .with_attachments(true)
            .with_spatial_reference(SpatialReference::WEB_MERCATOR);

        assert_eq!(params.extent, extent);
        assert_eq!(params.layer_ids.len(), 2);
        assert!(params.include_attachments);
        assert_eq!(params.spatial_reference, SpatialReference::WEB_MERCATOR);
    }

    #[test]
    fn sync_parameters_defaults() {
        let params = SyncParameters::default();
        assert_eq!(params.direction, SyncDirection::Bidirectional);
        assert!(!params.rollback_on_failure);
        assert!(params.layer_options.is_empty());
    }

    #[test]
    fn sync_parameters_layer_order() {
        let params = SyncParameters::for_layers([LayerId::new(3), LayerId::new(1)]);
        assert_eq!(params.layer_ids(), vec![LayerId::new(3), LayerId::new(1)]);
    }

    #[test]
    fn direction_display() {
        assert_eq!(SyncDirection::Bidirectional.to_string(), "bidirectional");
        assert_eq!(SyncDirection::Upload.to_string(), "upload");
        assert_eq!(SyncDirection::Download.to_string(), "download");
    }

    #[test]
    fn direction_legs() {
        assert!(SyncDirection::Bidirectional.uploads());
        assert!(SyncDirection::Bidirectional.downloads());
        assert!(SyncDirection::Upload.uploads());
        assert!(!SyncDirection::Upload.downloads());
        assert!(!SyncDirection::Download.uploads());
        assert!(SyncDirection::Download.downloads());
    }
}
