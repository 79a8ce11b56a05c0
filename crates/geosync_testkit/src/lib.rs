//! # GeoSync Testkit
//!
//! Test utilities for GeoSync.
//!
//! This crate provides:
//! - Seeded feature services and ready-made offline sessions
//! - Property-based test generators using proptest
//! - Common scenario builders (pending edits, mixed-geometry layers)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use geosync_testkit::prelude::*;
//!
//! #[test]
//! fn test_with_session() {
//!     with_ready_session(|session, service| {
//!         // ... generate already ran; edit and sync here
//!     });
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
