//! File-based replica backend.
//!
//! This module owns the on-disk layout of a replica:
//!
//! ```text
//! <replica_path>/
//! ├─ MANIFEST          # Replica metadata (id, extent, layer versions)
//! ├─ LOCK              # Advisory lock for exclusive ownership
//! ├─ layer-0000.tbl    # One CBOR table file per layer
//! └─ layer-0001.tbl
//! ```
//!
//! The LOCK file ensures only one process owns the replica at a time.
//! Table and manifest writes go through a temp-file-then-rename step so
//! a crash mid-write never leaves a half-written file behind.

use crate::backend::ReplicaBackend;
use crate::error::{StoreError, StoreResult};
use crate::manifest::ReplicaManifest;
use crate::record::FeatureRecord;
use fs2::FileExt;
use geosync_model::LayerId;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// File names within the replica directory.
const MANIFEST_FILE: &str = "MANIFEST";
const LOCK_FILE: &str = "LOCK";
/// Temporary suffix for atomic writes.
const TEMP_SUFFIX: &str = ".tmp";
/// Table file naming.
const TABLE_PREFIX: &str = "layer-";
const TABLE_SUFFIX: &str = ".tbl";

/// A file-based replica backend.
///
/// Data survives process restarts, including dirty flags: a pending
/// edit made offline is still pending after a relaunch.
///
/// # Thread Safety
///
/// The backend holds an exclusive lock on the replica directory. Only
/// one `FileBackend` instance can exist per directory at a time; a
/// second open fails with [`StoreError::ReplicaLocked`].
#[derive(Debug)]
pub struct FileBackend {
    /// Root directory path.
    path: PathBuf,
    /// Lock file handle (held for exclusive access).
    _lock_file: File,
}

impl FileBackend {
    /// Opens or creates a replica directory.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the replica directory
    /// * `create_if_missing` - If true, creates the directory if it doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - Another process holds the lock (returns `ReplicaLocked`)
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> StoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StoreError::corrupted(format!(
                    "replica directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(StoreError::corrupted(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        // Acquire exclusive lock (non-blocking)
        let lock_path = path.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        if lock_file.try_lock_exclusive().is_err() {
            return Err(StoreError::ReplicaLocked);
        }

        Ok(Self {
            path: path.to_path_buf(),
            _lock_file: lock_file,
        })
    }

    /// Returns the path to the replica directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn manifest_path(&self) -> PathBuf {
        self.path.join(MANIFEST_FILE)
    }

    fn table_path(&self, layer_id: LayerId) -> PathBuf {
        self.path
            .join(format!("{TABLE_PREFIX}{:04}{TABLE_SUFFIX}", layer_id.as_u32()))
    }

    /// Writes an encoded value atomically: temp file, sync, rename,
    /// then directory sync so the rename itself is durable.
    fn write_atomic<T: Serialize>(&self, target: &Path, value: &T) -> StoreResult<()> {
        let mut data = Vec::new();
        ciborium::ser::into_writer(value, &mut data)
            .map_err(|e| StoreError::encode(e.to_string()))?;

        let mut temp_name = target
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        temp_name.push(TEMP_SUFFIX);
        let temp_path = target.with_file_name(temp_name);

        {
            let mut file = File::create(&temp_path)?;
            std::io::Write::write_all(&mut file, &data)?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, target)?;
        self.sync_directory()?;
        Ok(())
    }

    fn read_decoded<T: DeserializeOwned>(&self, target: &Path) -> StoreResult<T> {
        let data = fs::read(target)?;
        ciborium::de::from_reader(data.as_slice()).map_err(|e| {
            StoreError::corrupted(format!("{}: {e}", target.display()))
        })
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StoreResult<()> {
        // On Unix, fsync on a directory syncs the directory entries
        let dir = File::open(&self.path)?;
        dir.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StoreResult<()> {
        // Windows NTFS journaling covers metadata durability
        Ok(())
    }
}

impl ReplicaBackend for FileBackend {
    fn read_manifest(&self) -> StoreResult<Option<ReplicaManifest>> {
        let manifest_path = self.manifest_path();
        if !manifest_path.exists() {
            return Ok(None);
        }
        self.read_decoded(&manifest_path).map(Some)
    }

    fn write_manifest(&self, manifest: &ReplicaManifest) -> StoreResult<()> {
        self.write_atomic(&self.manifest_path(), manifest)
    }

    fn create_table(&self, layer_id: LayerId) -> StoreResult<()> {
        let table_path = self.table_path(layer_id);
        if table_path.exists() {
            return Ok(());
        }
        self.write_atomic::<Vec<FeatureRecord>>(&table_path, &Vec::new())
    }

    fn read_table(&self, layer_id: LayerId) -> StoreResult<Vec<FeatureRecord>> {
        let table_path = self.table_path(layer_id);
        if !table_path.exists() {
            return Err(StoreError::TableMissing { layer_id });
        }
        self.read_decoded(&table_path)
    }

    fn write_table(&self, layer_id: LayerId, records: &[FeatureRecord]) -> StoreResult<()> {
        self.write_atomic(&self.table_path(layer_id), &records.to_vec())
    }

    fn table_ids(&self) -> StoreResult<Vec<LayerId>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.path)? {
            let entry = entry?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(middle) = name
                .strip_prefix(TABLE_PREFIX)
                .and_then(|rest| rest.strip_suffix(TABLE_SUFFIX))
            {
                if let Ok(raw) = middle.parse::<u32>() {
                    ids.push(LayerId::new(raw));
                }
            }
        }
        ids.sort();
        Ok(ids)
    }
}
