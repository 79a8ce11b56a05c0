//! # GeoSync Store
//!
//! Replica persistence and dirty tracking.
//!
//! This crate owns the local side of the offline workflow:
//! - [`ReplicaBackend`] - trait over the physical table storage
//! - [`MemoryBackend`] - ephemeral backend for tests and short sessions
//! - [`FileBackend`] - directory-per-replica persistent backend
//! - [`ReplicaStore`] - the feature tables plus per-feature dirty state
//! - [`Replica`] - the replica handle with its load lifecycle
//!
//! ## Design Principles
//!
//! - The store never touches the network; reconciliation lives upstream
//! - Every mutation is written through to the backend before it returns
//! - Dirty state survives restarts (a pending edit is data, not cache)
//! - A revision counter per record detects edits that land mid-sync

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod error;
mod file;
mod manifest;
mod memory;
mod record;
mod replica;
mod store;

pub use backend::ReplicaBackend;
pub use error::{StoreError, StoreResult};
pub use file::FileBackend;
pub use manifest::{LayerEntry, ReplicaManifest};
pub use memory::MemoryBackend;
pub use record::{DirtyState, FeatureRecord};
pub use replica::{LoadStatus, Replica};
pub use store::{DirtySnapshot, RemoteApply, ReplicaStore};
