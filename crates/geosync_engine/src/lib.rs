//! # GeoSync Engine
//!
//! Replica lifecycle jobs and the edit state machine for GeoSync.
//!
//! This crate provides:
//! - Edit state machine (no local replica → ready to sync ⇄ editing)
//! - Deferred-start background jobs with progress, cancel and done listeners
//! - Replica generation (negotiate → transfer → materialize → load)
//! - Bidirectional synchronization with upload echo suppression
//! - Feature selection and commit-style move / attribute edits
//! - Session event feed with bounded replayable history
//!
//! ## Architecture
//!
//! [`OfflineSession`] is the single entry point. It owns the state
//! machine, the attached replica and the event feed, and hands out a
//! [`JobHandle`] per background job:
//! 1. Generate extracts service pages into a fresh local replica
//! 2. Edits run synchronously against the replica store
//! 3. Sync uploads pending edits, then downloads remote changes
//!
//! The session applies a job's outcome to its own state **inside the
//! job's work**, so done listeners never observe a finished job with
//! a stale session.
//!
//! ## Key Invariants
//!
//! - At most one job per session; a second start is rejected, not queued
//! - Sync never changes the edit state
//! - Dirty records are cleared last, guarded by revision, so edits made
//!   mid-sync survive to the next pass
//! - A local pending edit always wins over a downloaded change
//! - Cancelled or failed generation leaves no partial replica behind

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod edit;
mod error;
mod events;
mod generate;
mod job;
mod session;
mod state;
mod sync;

pub use config::{ReplicaStorage, SessionConfig};
pub use edit::{EditController, SelectedFeature, Selection};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use events::{SessionEvent, SessionEventFeed};
pub use generate::GenerateOptions;
pub use job::{JobContext, JobHandle, JobKind, JobStatus};
pub use session::OfflineSession;
pub use state::{EditAction, EditState, EditStateMachine};
