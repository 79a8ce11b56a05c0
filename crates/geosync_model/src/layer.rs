//! Layer metadata.

use crate::geometry::GeometryKind;
use crate::ids::LayerId;
use serde::{Deserialize, Serialize};

/// Metadata describing one layer of a feature service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerInfo {
    /// Stable layer identifier.
    pub id: LayerId,
    /// Human-readable layer name.
    pub name: String,
    /// The geometry kind of every feature in the layer.
    pub geometry_kind: GeometryKind,
}

impl LayerInfo {
    /// Creates layer metadata.
    #[must_use]
    pub fn new(id: LayerId, name: impl Into<String>, geometry_kind: GeometryKind) -> Self {
        Self {
            id,
            name: name.into(),
            geometry_kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_info_construction() {
        let info = LayerInfo::new(LayerId::new(0), "damage_points", GeometryKind::Point);
        assert_eq!(info.id, LayerId::new(0));
        assert_eq!(info.name, "damage_points");
        assert!(info.geometry_kind.is_movable());
    }
}
