use thiserror::Error;

/// Errors that can occur while storing or reading documents.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No document is stored under the key.
    #[error("document not found: {0}")]
    NotFound(String),
    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The key is not a 64-character hex SHA-256 digest.
    #[error("invalid document key: {0}")]
    InvalidKey(String),
    /// The upload exceeds the configured size limit.
    #[error("document exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
