//! Persistence boundary: three named snapshots, each rewritten wholesale.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::StoreError;

/// Storage for complete snapshot blobs addressed by name.
pub trait SnapshotBackend: Send {
    /// `Ok(None)` when the snapshot has never been written.
    fn read(&self, name: &'static str) -> Result<Option<String>, StoreError>;

    /// Replace the named snapshot; readers see either the old or the new blob.
    fn write(&mut self, name: &'static str, contents: &str) -> Result<(), StoreError>;
}

/// One JSON file per snapshot under a root directory.
#[derive(Debug, Clone)]
pub struct DirSnapshots {
    root: PathBuf,
}

impl DirSnapshots {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|source| StoreError::io("creating data directory", &root, source))?;
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl SnapshotBackend for DirSnapshots {
    fn read(&self, name: &'static str) -> Result<Option<String>, StoreError> {
        let path = self.path_of(name);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::io("reading snapshot", path, source)),
        }
    }

    fn write(&mut self, name: &'static str, contents: &str) -> Result<(), StoreError> {
        let path = self.path_of(name);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, contents)
            .map_err(|source| StoreError::io("writing temporary snapshot", &temp_path, source))?;
        fs::rename(&temp_path, &path)
            .map_err(|source| StoreError::io("replacing snapshot", &path, source))?;
        tracing::trace!(path = %path.display(), bytes = contents.len(), "snapshot written");
        Ok(())
    }
}

/// In-process snapshots; clones share the same blobs.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshots {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    blobs: BTreeMap<&'static str, String>,
    reject_writes: bool,
    rejected: BTreeSet<&'static str>,
    writes: usize,
}

impl MemorySnapshots {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_blob(self, name: &'static str, contents: impl Into<String>) -> Self {
        self.lock().blobs.insert(name, contents.into());
        self
    }

    /// Make every later write fail with [`StoreError::WriteRejected`].
    pub fn reject_writes(&self, reject: bool) {
        self.lock().reject_writes = reject;
    }

    /// Make later writes of one snapshot fail while the others succeed.
    pub fn reject_writes_to(&self, name: &'static str) {
        self.lock().rejected.insert(name);
    }

    #[must_use]
    pub fn blob(&self, name: &str) -> Option<String> {
        self.lock().blobs.get(name).cloned()
    }

    /// Number of successful writes across all snapshots.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.lock().writes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SnapshotBackend for MemorySnapshots {
    fn read(&self, name: &'static str) -> Result<Option<String>, StoreError> {
        Ok(self.lock().blobs.get(name).cloned())
    }

    fn write(&mut self, name: &'static str, contents: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.reject_writes || inner.rejected.contains(name) {
            return Err(StoreError::WriteRejected { snapshot: name });
        }
        inner.blobs.insert(name, contents.to_owned());
        inner.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{DirSnapshots, MemorySnapshots, SnapshotBackend};
    use crate::error::StoreError;

    #[test]
    fn dir_snapshots_report_missing_as_none_and_leave_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        let mut backend = DirSnapshots::new(dir.path().join("data")).expect("backend");

        assert!(backend.read("messages.json").expect("read").is_none());

        backend.write("messages.json", "[]").expect("write");
        assert_eq!(
            backend.read("messages.json").expect("read").as_deref(),
            Some("[]")
        );
        assert!(!backend.path_of("messages.json.tmp").exists());
        assert!(!backend.root().join("messages.json.tmp").exists());
    }

    #[test]
    fn memory_snapshots_share_blobs_between_clones() {
        let shared = MemorySnapshots::new();
        let mut writer = shared.clone();
        writer.write("notes.json", "{}").expect("write");

        assert_eq!(shared.blob("notes.json").as_deref(), Some("{}"));
        assert_eq!(shared.write_count(), 1);

        shared.reject_writes(true);
        let error = writer.write("notes.json", "{\"a\":[]}").expect_err("rejected");
        assert!(matches!(error, StoreError::WriteRejected { snapshot: "notes.json" }));
        assert_eq!(shared.blob("notes.json").as_deref(), Some("{}"));
    }
}
