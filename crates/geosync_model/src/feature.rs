//! Feature records and attribute values.

use crate::geometry::Geometry;
use crate::ids::FeatureId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed attribute value.
///
/// The remote service's attribute schema is not modeled here; values
/// are carried as-is and compared structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Absent or explicitly null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => write!(f, "null"),
            AttributeValue::Bool(v) => write!(f, "{v}"),
            AttributeValue::Int(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{v}"),
            AttributeValue::Text(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Bool(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Int(v)
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        AttributeValue::Float(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

/// A geospatial feature: identifier, shape, and named attributes.
///
/// Features are created by the remote service; a replica copies them
/// locally and edits mutate the copy until the next sync uploads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    /// Identifier, unique within the feature's layer.
    pub id: FeatureId,
    /// The feature's shape.
    pub geometry: Geometry,
    /// Named attribute values, ordered by name.
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl Feature {
    /// Creates a feature with no attributes.
    #[must_use]
    pub fn new(id: FeatureId, geometry: impl Into<Geometry>) -> Self {
        Self {
            id,
            geometry: geometry.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Adds an attribute, consuming and returning the feature.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Returns the value of the named attribute, if present.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes.get(name)
    }

    /// Sets the value of the named attribute.
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<AttributeValue>) {
        self.attributes.insert(name.into(), value.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn make_feature(id: u64) -> Feature {
        Feature::new(FeatureId::new(id), Point::new(1.0, 2.0))
            .with_attribute("typdamage", "Minor")
            .with_attribute("inspected", true)
    }

    #[test]
    fn attribute_access() {
        let f = make_feature(1);
        assert_eq!(
            f.attribute("typdamage"),
            Some(&AttributeValue::Text("Minor".into()))
        );
        assert_eq!(f.attribute("missing"), None);
    }

    #[test]
    fn set_attribute_overwrites() {
        let mut f = make_feature(1);
        f.set_attribute("typdamage", "Destroyed");
        assert_eq!(
            f.attribute("typdamage"),
            Some(&AttributeValue::Text("Destroyed".into()))
        );
    }

    #[test]
    fn attribute_value_conversions() {
        assert_eq!(AttributeValue::from(3i64), AttributeValue::Int(3));
        assert_eq!(AttributeValue::from(0.5f64), AttributeValue::Float(0.5));
        assert_eq!(AttributeValue::from(true), AttributeValue::Bool(true));
        assert_eq!(
            AttributeValue::from("x".to_string()),
            AttributeValue::Text("x".into())
        );
    }

    #[test]
    fn attribute_value_display() {
        assert_eq!(AttributeValue::Null.to_string(), "null");
        assert_eq!(AttributeValue::Text("Major".into()).to_string(), "Major");
        assert_eq!(AttributeValue::Int(-4).to_string(), "-4");
    }

    #[test]
    fn serde_roundtrip() {
        let f = make_feature(9);
        let json = serde_json::to_string(&f).unwrap();
        let back: Feature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, f);
    }
}
