mod error;
mod key;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemDocumentStore;
pub use key::DocumentKey;
pub use traits::{BoxReader, DocumentStore};
