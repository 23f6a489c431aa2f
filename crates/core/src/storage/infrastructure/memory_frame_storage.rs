use std::collections::HashMap;
use std::sync::RwLock;

use crate::storage::domain::frame_storage::{FrameStorage, StorageError};

/// Process-local storage backed by a map; used for in-process runs and tests.
#[derive(Default)]
pub struct MemoryFrameStorage {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryFrameStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .read()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }
}

impl FrameStorage for MemoryFrameStorage {
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.read().map_err(|_| poisoned(key))?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                key: key.to_string(),
            })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let mut objects = self.objects.write().map_err(|_| poisoned(key))?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}

fn poisoned(key: &str) -> StorageError {
    StorageError::Io {
        key: key.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, "storage lock poisoned"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_and_counts() {
        let storage = MemoryFrameStorage::new();
        assert!(storage.is_empty());
        storage.put("k", b"v").unwrap();
        assert_eq!(storage.get("k").unwrap(), b"v");
        assert_eq!(storage.len(), 1);
        assert!(storage.contains("k"));
    }

    #[test]
    fn test_missing_is_not_found() {
        let storage = MemoryFrameStorage::new();
        assert!(storage.get("k").unwrap_err().is_not_found());
    }
}
