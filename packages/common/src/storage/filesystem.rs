use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::BufReader;

use super::error::StorageError;
use super::key::DocumentKey;
use super::traits::{BoxReader, DocumentStore};

/// Filesystem-backed document store.
///
/// Documents live at `{base_path}/{2 hex chars}/{62 hex chars}`. Writes go to
/// `{base_path}/.tmp` first and are renamed into place, so a reader never
/// observes a partial file.
pub struct FilesystemDocumentStore {
    base_path: PathBuf,
    max_size: u64,
}

impl FilesystemDocumentStore {
    pub async fn new(base_path: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            max_size,
        })
    }

    fn document_path(&self, key: &DocumentKey) -> PathBuf {
        self.base_path.join(key.shard()).join(key.file_name())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }
}

#[async_trait]
impl DocumentStore for FilesystemDocumentStore {
    async fn put(&self, data: &[u8]) -> Result<DocumentKey, StorageError> {
        let size = data.len() as u64;
        if size > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: size,
                limit: self.max_size,
            });
        }

        let key = DocumentKey::for_content(data);
        let path = self.document_path(&key);
        if fs::try_exists(&path).await? {
            return Ok(key);
        }

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        tracing::debug!(key = %key, size, "Stored document");
        Ok(key)
    }

    async fn open(&self, key: &DocumentKey) -> Result<BoxReader, StorageError> {
        match fs::File::open(self.document_path(key)).await {
            Ok(file) => Ok(Box::new(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &DocumentKey) -> Result<bool, StorageError> {
        Ok(fs::try_exists(self.document_path(key)).await?)
    }

    async fn delete(&self, key: &DocumentKey) -> Result<bool, StorageError> {
        match fs::remove_file(self.document_path(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
