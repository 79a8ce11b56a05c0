//! # GeoSync Model
//!
//! Core data model shared by every GeoSync crate.
//!
//! This crate defines the vocabulary of the system:
//! - Identifier newtypes ([`FeatureId`], [`LayerId`], [`ReplicaId`])
//! - Geometry ([`Point`], [`Envelope`], [`Geometry`], [`GeometryKind`])
//! - [`Feature`] records and their typed [`AttributeValue`]s
//! - [`LayerInfo`] service metadata
//!
//! ## Design Principles
//!
//! - Plain data: no I/O, no locking, no network knowledge
//! - Everything is `serde`-serializable (replica persistence and the
//!   reference service both speak these types)
//! - Editability is a property of the geometry *tag*, not of runtime
//!   type inspection ([`GeometryKind::is_movable`])

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod feature;
mod geometry;
mod ids;
mod layer;

pub use feature::{AttributeValue, Feature};
pub use geometry::{Envelope, Geometry, GeometryKind, Point, SpatialReference};
pub use ids::{FeatureId, LayerId, ReplicaId};
pub use layer::LayerInfo;
