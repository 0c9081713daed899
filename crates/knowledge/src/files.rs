//! File store contract.
//!
//! The pipeline never owns raw document bytes; it reads them by opaque
//! reference from whatever storage backs uploads (local disk, object
//! store, ...).

use ragflow_core::{AppError, AppResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Supplies raw document bytes by reference.
pub trait FileStore: Send + Sync {
    /// Read the full contents for a storage reference.
    fn read(&self, reference: &str) -> AppResult<Vec<u8>>;
}

/// File store over a local directory; references are paths relative to the
/// root.
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FileStore for LocalFileStore {
    fn read(&self, reference: &str) -> AppResult<Vec<u8>> {
        let relative = Path::new(reference);
        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AppError::Knowledge(format!(
                "Invalid storage reference: {}",
                reference
            )));
        }

        let path = self.root.join(relative);
        Ok(std::fs::read(path)?)
    }
}

/// In-memory file store for tests and single-process deployments.
#[derive(Default)]
pub struct MemoryFileStore {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store bytes under a reference, returning the reference.
    pub fn put(&self, reference: impl Into<String>, bytes: Vec<u8>) -> String {
        let reference = reference.into();
        if let Ok(mut files) = self.files.write() {
            files.insert(reference.clone(), bytes);
        }
        reference
    }
}

impl FileStore for MemoryFileStore {
    fn read(&self, reference: &str) -> AppResult<Vec<u8>> {
        self.files
            .read()
            .map_err(|_| AppError::Knowledge("File store lock poisoned".to_string()))?
            .get(reference)
            .cloned()
            .ok_or_else(|| AppError::Knowledge(format!("No stored file for: {}", reference)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryFileStore::new();
        store.put("doc-1.txt", b"hello".to_vec());

        assert_eq!(store.read("doc-1.txt").unwrap(), b"hello");
        assert!(store.read("missing.txt").is_err());
    }

    #[test]
    fn test_local_store_reads_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("upload.txt"), b"content").unwrap();

        let store = LocalFileStore::new(dir.path());
        assert_eq!(store.read("upload.txt").unwrap(), b"content");
    }

    #[test]
    fn test_local_store_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalFileStore::new(dir.path());

        assert!(store.read("../etc/passwd").is_err());
        assert!(store.read("/etc/passwd").is_err());
    }
}
