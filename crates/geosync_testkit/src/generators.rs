//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random geospatial test data
//! that maintains required invariants.

use geosync_model::{AttributeValue, Envelope, Feature, FeatureId, Geometry, LayerId, Point};
use proptest::prelude::*;

/// Coordinate range every generated point stays inside.
const COORD_RANGE: std::ops::Range<f64> = -10_000.0..10_000.0;

/// Strategy for generating feature IDs.
pub fn feature_id_strategy() -> impl Strategy<Value = FeatureId> {
    any::<u64>().prop_map(FeatureId::new)
}

/// Strategy for generating layer IDs from a small pool, so sequences
/// of operations collide on the same layers.
pub fn layer_id_strategy() -> impl Strategy<Value = LayerId> {
    (0u32..4).prop_map(LayerId::new)
}

/// Strategy for generating valid layer names.
pub fn layer_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z][a-zA-Z0-9_]{0,31}")
        .expect("Invalid regex")
        .prop_filter("Layer name must not be empty", |s| !s.is_empty())
}

/// Strategy for generating points with finite coordinates.
pub fn point_strategy() -> impl Strategy<Value = Point> {
    (COORD_RANGE, COORD_RANGE).prop_map(|(x, y)| Point::new(x, y))
}

/// Strategy for generating envelopes; corners are normalized so the
/// minimum is never greater than the maximum.
pub fn envelope_strategy() -> impl Strategy<Value = Envelope> {
    (point_strategy(), point_strategy())
        .prop_map(|(a, b)| Envelope::new(a.x, a.y, b.x, b.y))
}

/// Strategy for generating attribute values.
pub fn attribute_value_strategy() -> impl Strategy<Value = AttributeValue> {
    prop_oneof![
        Just(AttributeValue::Null),
        any::<bool>().prop_map(AttributeValue::Bool),
        any::<i64>().prop_map(AttributeValue::Int),
        COORD_RANGE.prop_map(AttributeValue::Float),
        prop::string::string_regex("[a-z]{1,12}")
            .expect("Invalid regex")
            .prop_map(AttributeValue::Text),
    ]
}

/// Strategy for generating point features with a few attributes.
pub fn feature_strategy() -> impl Strategy<Value = Feature> {
    (
        feature_id_strategy(),
        point_strategy(),
        prop::collection::btree_map(
            prop::string::string_regex("[a-z]{1,10}").expect("Invalid regex"),
            attribute_value_strategy(),
            0..4,
        ),
    )
        .prop_map(|(id, point, attributes)| {
            let mut feature = Feature::new(id, point);
            feature.attributes = attributes;
            feature
        })
}

/// Strategy for generating polygon features; rings keep 3 to 8
/// vertices.
pub fn polygon_feature_strategy() -> impl Strategy<Value = Feature> {
    (
        feature_id_strategy(),
        prop::collection::vec(point_strategy(), 3..8),
    )
        .prop_map(|(id, ring)| Feature::new(id, Geometry::Polygon(ring)))
}

/// One local edit against a replica store.
#[derive(Debug, Clone)]
pub enum FeatureEdit {
    /// Write a feature and mark it pending.
    Put {
        /// The feature to write.
        feature: Feature,
    },
    /// Move an existing feature to a new location.
    Move {
        /// Target feature.
        id: FeatureId,
        /// New location.
        to: Point,
    },
}

/// Strategy for generating feature edits.
pub fn feature_edit_strategy() -> impl Strategy<Value = FeatureEdit> {
    prop_oneof![
        2 => feature_strategy().prop_map(|feature| FeatureEdit::Put { feature }),
        1 => (feature_id_strategy(), point_strategy())
            .prop_map(|(id, to)| FeatureEdit::Move { id, to }),
    ]
}

/// Strategy for generating a sequence of edits.
pub fn edit_sequence_strategy(
    min_edits: usize,
    max_edits: usize,
) -> impl Strategy<Value = Vec<FeatureEdit>> {
    prop::collection::vec(feature_edit_strategy(), min_edits..max_edits)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Creates a configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
