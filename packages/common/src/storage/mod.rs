//! Content-addressed storage for uploaded files (chat attachments,
//! classroom resources, submission files).

mod error;
mod hash;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemFileStore;
pub use hash::ContentHash;
pub use traits::{BoxReader, FileStore};
