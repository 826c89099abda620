//! File storage abstraction.
//!
//! The stores and the export pipeline never touch the filesystem directly
//! for uploaded content; they go through [`FileStore`], which keeps the
//! core portable across backends and puts idempotent directory handling in
//! one place.

use crate::error::{FormFoldError, FormFoldResult};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Write-once file storage with opaque paths.
///
/// `store` always writes to a fresh, collision-free path derived from the
/// suggested name; files are never mutated in place after creation, only
/// deleted.
pub trait FileStore: Send + Sync {
    /// Writes bytes under the given directory and returns the stored path.
    fn store(&self, dir: &Path, suggested_name: &str, bytes: &[u8]) -> FormFoldResult<PathBuf>;

    /// Deletes a stored file, reporting whether it existed.
    fn delete(&self, path: &Path) -> FormFoldResult<bool>;

    /// Whether a stored file exists.
    fn exists(&self, path: &Path) -> bool;

    /// Reads a stored file's contents.
    fn read(&self, path: &Path) -> FormFoldResult<Vec<u8>>;

    /// Idempotently ensures a storage directory exists.
    fn ensure_dir(&self, dir: &Path) -> FormFoldResult<()>;
}

/// Local filesystem implementation of [`FileStore`].
#[derive(Debug, Clone, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    pub fn new() -> Self {
        Self
    }

    /// Derives a collision-free filename: the sanitized stem, a random
    /// suffix, and the original extension.
    fn unique_filename(suggested_name: &str) -> String {
        let path = Path::new(suggested_name);
        let stem = path
            .file_stem()
            .map(|s| sanitize_name(&s.to_string_lossy()))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "file".to_string());
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        match path.extension() {
            Some(ext) => format!("{}_{}.{}", stem, suffix, ext.to_string_lossy().to_lowercase()),
            None => format!("{}_{}", stem, suffix),
        }
    }
}

impl FileStore for LocalFileStore {
    fn store(&self, dir: &Path, suggested_name: &str, bytes: &[u8]) -> FormFoldResult<PathBuf> {
        self.ensure_dir(dir)?;
        let path = dir.join(Self::unique_filename(suggested_name));
        std::fs::write(&path, bytes)?;
        log::debug!("stored {} bytes at {}", bytes.len(), path.display());
        Ok(path)
    }

    fn delete(&self, path: &Path) -> FormFoldResult<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FormFoldError::Storage(format!(
                "Failed to delete stored file: {}",
                e
            ))),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> FormFoldResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                FormFoldError::NotFound(format!("File {} not found", path.display()))
            }
            _ => FormFoldError::Storage(format!("Failed to read stored file: {}", e)),
        })
    }

    fn ensure_dir(&self, dir: &Path) -> FormFoldResult<()> {
        std::fs::create_dir_all(dir)
            .map_err(|e| FormFoldError::Storage(format!("Failed to create directory: {}", e)))
    }
}

/// Replaces anything outside `[A-Za-z0-9_-]` with underscores and collapses
/// runs, for filenames derived from user-supplied text.
pub fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_separator = false;
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c);
            last_was_separator = false;
        } else if !last_was_separator {
            out.push('_');
            last_was_separator = true;
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn store_read_delete_round_trip() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new();
        let path = store
            .store(dir.path(), "photo.PNG", b"image-bytes")
            .unwrap();
        assert!(store.exists(&path));
        assert_eq!(store.read(&path).unwrap(), b"image-bytes");
        assert!(store.delete(&path).unwrap());
        assert!(!store.exists(&path));
        assert!(!store.delete(&path).unwrap());
    }

    #[test]
    fn stored_names_never_collide() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new();
        let a = store.store(dir.path(), "cv.pdf", b"a").unwrap();
        let b = store.store(dir.path(), "cv.pdf", b"b").unwrap();
        assert_ne!(a, b);
        assert_eq!(store.read(&a).unwrap(), b"a");
        assert_eq!(store.read(&b).unwrap(), b"b");
    }

    #[test]
    fn ensure_dir_is_idempotent() {
        let dir = tempdir().unwrap();
        let store = LocalFileStore::new();
        let nested = dir.path().join("a/b/c");
        store.ensure_dir(&nested).unwrap();
        store.ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn read_missing_is_not_found() {
        let store = LocalFileStore::new();
        let err = store.read(Path::new("/definitely/not/here.bin")).unwrap_err();
        assert!(matches!(err, crate::error::FormFoldError::NotFound(_)));
    }

    #[test]
    fn sanitize_collapses_and_trims() {
        assert_eq!(sanitize_name("Contact Form (2026)!"), "Contact_Form_2026");
        assert_eq!(sanitize_name("  weird///name  "), "weird_name");
        assert_eq!(sanitize_name("***"), "");
    }
}
