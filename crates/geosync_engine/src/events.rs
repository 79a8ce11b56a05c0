//! Session events for observers.
//!
//! The feed distributes events to channel subscribers and keeps a
//! bounded history, so a late observer (or a test) can inspect what
//! happened without having subscribed up front.

use std::sync::mpsc::{self, Receiver, Sender};

use parking_lot::RwLock;

use geosync_service::FeatureEditResult;

use crate::error::ErrorKind;
use crate::job::JobKind;
use crate::state::EditState;

/// An observable event emitted by a session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The edit state moved.
    StateChanged {
        /// State left behind.
        from: EditState,
        /// State entered.
        to: EditState,
    },
    /// A running job reported progress.
    Progress {
        /// Which job reported.
        job: JobKind,
        /// Percent complete, 0 to 100.
        percent: u8,
    },
    /// A sync pass finished and produced per-feature results.
    SyncResult {
        /// One entry per uploaded edit, success or failure.
        results: Vec<FeatureEditResult>,
    },
    /// Something failed.
    Error {
        /// Failure classification.
        kind: ErrorKind,
        /// Human-readable description.
        message: String,
    },
}

/// Distributes [`SessionEvent`]s to subscribers.
///
/// Disconnected subscribers are dropped on the next emit. History is
/// trimmed from the front once it exceeds the configured bound.
#[derive(Debug)]
pub struct SessionEventFeed {
    subscribers: RwLock<Vec<Sender<SessionEvent>>>,
    history: RwLock<Vec<SessionEvent>>,
    max_history: usize,
}

impl SessionEventFeed {
    /// Creates a feed retaining at most `max_history` events.
    #[must_use]
    pub fn new(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Subscribes to all future events.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Emits an event to history and every live subscriber.
    pub fn emit(&self, event: SessionEvent) {
        {
            let mut history = self.history.write();
            history.push(event.clone());
            if history.len() > self.max_history {
                let excess = history.len() - self.max_history;
                history.drain(0..excess);
            }
        }
        self.subscribers
            .write()
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the retained events, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<SessionEvent> {
        self.history.read().clone()
    }

    /// Number of retained events.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}
