/// Errors raised by a [`FileStore`](super::FileStore).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// No stored file has this content hash.
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The hex string does not describe a SHA-256 digest.
    #[error("invalid content hash: {0}")]
    InvalidHash(String),
    /// The upload is larger than the configured limit.
    #[error("file exceeds size limit ({actual} > {limit} bytes)")]
    TooLarge { actual: u64, limit: u64 },
}
