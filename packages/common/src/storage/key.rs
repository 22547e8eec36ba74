use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::StorageError;

/// Reference to a stored document: the hex SHA-256 of its bytes.
///
/// This is the only thing the database keeps about an uploaded file besides
/// its display name.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Derive the key for the given bytes.
    pub fn for_content(data: &[u8]) -> Self {
        Self(hex::encode(Sha256::digest(data)))
    }

    /// Validate a key read back from the database.
    pub fn parse(s: &str) -> Result<Self, StorageError> {
        if s.len() != 64 {
            return Err(StorageError::InvalidKey(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        if !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(StorageError::InvalidKey(
                "expected lowercase hex characters".into(),
            ));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Directory shard (first two hex characters).
    pub(crate) fn shard(&self) -> &str {
        &self.0[..2]
    }

    /// File name within the shard.
    pub(crate) fn file_name(&self) -> &str {
        &self.0[2..]
    }
}

impl fmt::Debug for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentKey({})", self.0)
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DocumentKey {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<DocumentKey> for String {
    fn from(key: DocumentKey) -> Self {
        key.0
    }
}
