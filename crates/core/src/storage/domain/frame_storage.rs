use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("no object stored at {key}")]
    NotFound { key: String },
    #[error("invalid storage key {key}")]
    InvalidKey { key: String },
    #[error("i/o failure on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

/// Domain interface for durable frame and artifact storage.
///
/// Keys follow the scheme in [`crate::shared::frame_ref`]. Implementations
/// must be shareable across shard workers; each frame key is written by
/// exactly one worker, so no cross-key locking is required.
pub trait FrameStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StorageError>;
}
