//! # GeoSync Service
//!
//! The remote feature service contract.
//!
//! This crate defines what the engine expects from the server side of
//! the offline workflow:
//! - [`FeatureService`] - trait over the remote API (negotiate,
//!   extract, apply edits, pull changes, query)
//! - [`GenerateParameters`] / [`SyncParameters`] - knobs for the two
//!   long-running flows
//! - [`FeatureEditResult`] - per-feature edit outcome
//! - [`FeaturePage`] / [`ChangePage`] - paged transfer units
//! - [`MemoryFeatureService`] - reference implementation with failure
//!   injection for tests and demos
//!
//! ## Design Principles
//!
//! - The service is a dumb store with versions; sync policy lives in
//!   the engine
//! - Per-feature edit outcomes are independent unless the caller asks
//!   for rollback
//! - Network failures are typed and flagged retryable or not

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod edits;
mod error;
mod memory;
mod page;
mod params;
mod service;

pub use edits::{completed_with_errors, EditFailure, FeatureEditResult};
pub use error::{ServiceError, ServiceResult};
pub use memory::MemoryFeatureService;
pub use page::{ChangePage, FeaturePage};
pub use params::{GenerateParameters, SyncDirection, SyncLayerOption, SyncParameters};
pub use service::FeatureService;
