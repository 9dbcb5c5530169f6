//! Snapshot storage.
//!
//! One JSON file per queue at `<prefix>-<queue id>.json`, holding the last
//! observed [`Snapshot`]. The file is the single source of truth for change
//! detection between runs.
//!
//! # Atomic Writes
//!
//! Saves use write-to-temp-then-rename:
//! 1. Write to `<prefix>-<id>.json.tmp`
//! 2. fsync the file
//! 3. Rename over `<prefix>-<id>.json`
//! 4. fsync the directory
//!
//! A reader sees either the old or the new snapshot, never a partial one,
//! and `save` only returns once the new snapshot is durable. The watcher
//! relies on that: the snapshot must be on disk before a notification goes
//! out.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::{QueueId, Snapshot};

/// Durable per-queue snapshot storage.
pub trait StateStore: Send + Sync {
    /// Load the last saved snapshot. `None` means the queue was never seen.
    fn load(&self, queue: QueueId) -> Result<Option<Snapshot>>;

    /// Replace the saved snapshot for a queue.
    fn save(&self, queue: QueueId, snapshot: &Snapshot) -> Result<()>;
}

/// File-backed [`StateStore`].
#[derive(Debug, Clone)]
pub struct FileStateStore {
    prefix: PathBuf,
}

impl FileStateStore {
    pub fn new(prefix: impl Into<PathBuf>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Path of the state file for a queue.
    pub fn path_for(&self, queue: QueueId) -> PathBuf {
        let mut path = self.prefix.clone().into_os_string();
        path.push(format!("-{queue}.json"));
        PathBuf::from(path)
    }
}

impl StateStore for FileStateStore {
    fn load(&self, queue: QueueId) -> Result<Option<Snapshot>> {
        let path = self.path_for(queue);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(Error::Storage { path, source }),
        };
        let snapshot =
            serde_json::from_str(&content).map_err(|source| Error::CorruptState { path, source })?;
        Ok(Some(snapshot))
    }

    fn save(&self, queue: QueueId, snapshot: &Snapshot) -> Result<()> {
        let path = self.path_for(queue);
        let json = serde_json::to_vec(snapshot).map_err(|source| Error::CorruptState {
            path: path.clone(),
            source,
        })?;
        write_atomically(&path, &json).map_err(|source| Error::Storage { path, source })
    }
}

fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut tmp_path = path.as_os_str().to_owned();
    tmp_path.push(".tmp");
    let tmp_path = PathBuf::from(tmp_path);

    {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    std::fs::rename(&tmp_path, path)?;
    fsync_dir(parent_dir(path))
}

/// Directory holding `path`; `.` for bare file names.
fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Sync a directory so a rename into it survives power loss.
fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_appends_queue_id_to_prefix() {
        let store = FileStateStore::new("/var/lib/herald/state");
        assert_eq!(
            store.path_for(QueueId(42)),
            PathBuf::from("/var/lib/herald/state-42.json")
        );
    }

    #[test]
    fn bare_file_name_syncs_current_dir() {
        assert_eq!(parent_dir(Path::new("state-1.json")), Path::new("."));
        assert_eq!(parent_dir(Path::new("/tmp/state-1.json")), Path::new("/tmp"));
    }
}
