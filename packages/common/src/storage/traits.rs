use async_trait::async_trait;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::key::DocumentKey;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Store for uploaded assignment documents and submission files.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Store bytes and return their key. Storing identical bytes twice yields
    /// the same key and a single copy.
    async fn put(&self, data: &[u8]) -> Result<DocumentKey, StorageError>;

    /// Open a stored document for streaming.
    async fn open(&self, key: &DocumentKey) -> Result<BoxReader, StorageError>;

    async fn exists(&self, key: &DocumentKey) -> Result<bool, StorageError>;

    /// Returns `true` if the document was deleted, `false` if it did not exist.
    async fn delete(&self, key: &DocumentKey) -> Result<bool, StorageError>;
}
