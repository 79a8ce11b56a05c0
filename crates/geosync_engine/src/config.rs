//! Session configuration.

use std::path::PathBuf;

/// Where generated replicas are materialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplicaStorage {
    /// Keep the replica in memory; it is lost when the session drops.
    Memory,
    /// Create a `replica-<id>` directory per replica under this path.
    Directory(PathBuf),
}

/// Configuration for an offline session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Replica storage location.
    pub storage: ReplicaStorage,
    /// Page size for feature extraction and change downloads.
    pub page_size: u32,
    /// Number of session events retained for late observers.
    pub event_history: usize,
}

impl SessionConfig {
    /// Creates an in-memory configuration with default page sizes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: ReplicaStorage::Memory,
            page_size: 128,
            event_history: 256,
        }
    }

    /// Materializes replicas under the given directory.
    #[must_use]
    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage = ReplicaStorage::Directory(path.into());
        self
    }

    /// Sets the transfer page size. Zero is treated as one.
    #[must_use]
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = size.max(1);
        self
    }

    /// Sets the number of events the session retains.
    #[must_use]
    pub fn with_event_history(mut self, events: usize) -> Self {
        self.event_history = events;
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_in_memory() {
        let config = SessionConfig::default();
        assert_eq!(config.storage, ReplicaStorage::Memory);
        assert_eq!(config.page_size, 128);
        assert_eq!(config.event_history, 256);
    }

    #[test]
    fn builder_overrides() {
        let config = SessionConfig::new()
            .with_directory("/tmp/replicas")
            .with_page_size(16)
            .with_event_history(8);
        assert_eq!(
            config.storage,
            ReplicaStorage::Directory(PathBuf::from("/tmp/replicas"))
        );
        assert_eq!(config.page_size, 16);
        assert_eq!(config.event_history, 8);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        assert_eq!(SessionConfig::new().with_page_size(0).page_size, 1);
    }
}
