use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Component, Path, PathBuf};

use crate::storage::domain::frame_storage::{FrameStorage, StorageError};

/// Stores objects as files below a root directory, one file per key.
///
/// Writes go to a `.part` sibling first and are renamed into place, so a
/// reader never observes a half-written frame.
pub struct FsFrameStorage {
    root: PathBuf,
}

impl FsFrameStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let is_plain = !key.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            return Err(StorageError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

impl FrameStorage for FsFrameStorage {
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(key)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound {
                key: key.to_string(),
            },
            _ => StorageError::Io {
                key: key.to_string(),
                source: e,
            },
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let io_err = |source| StorageError::Io {
            key: key.to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let temp_path = path.with_extension("part");
        let mut file = fs::File::create(&temp_path).map_err(io_err)?;
        file.write_all(bytes).map_err(io_err)?;
        file.flush().map_err(io_err)?;
        drop(file);

        fs::rename(&temp_path, &path).map_err(io_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_put_then_get() {
        let tmp = TempDir::new().unwrap();
        let storage = FsFrameStorage::new(tmp.path());
        storage.put("videos/temporal/v/frame-1.png", b"abc").unwrap();
        assert_eq!(storage.get("videos/temporal/v/frame-1.png").unwrap(), b"abc");
        assert!(tmp.path().join("videos/temporal/v/frame-1.png").exists());
    }

    #[test]
    fn test_put_overwrites() {
        let tmp = TempDir::new().unwrap();
        let storage = FsFrameStorage::new(tmp.path());
        storage.put("a/b.bin", b"one").unwrap();
        storage.put("a/b.bin", b"two").unwrap();
        assert_eq!(storage.get("a/b.bin").unwrap(), b"two");
    }

    #[test]
    fn test_put_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let storage = FsFrameStorage::new(tmp.path());
        storage.put("a/b.png", b"x").unwrap();
        assert!(!tmp.path().join("a/b.part").exists());
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let storage = FsFrameStorage::new(tmp.path());
        let err = storage.get("nothing/here.png").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_rejects_escaping_keys() {
        let tmp = TempDir::new().unwrap();
        let storage = FsFrameStorage::new(tmp.path());
        for key in ["../outside.png", "/etc/passwd", "", "a/../../b"] {
            assert!(
                matches!(storage.get(key), Err(StorageError::InvalidKey { .. })),
                "{key}"
            );
        }
    }
}
