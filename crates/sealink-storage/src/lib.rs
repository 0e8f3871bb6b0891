//! # sealink storage
//!
//! The storage-adapter contract that decouples payload placement from the
//! messaging protocol: `upload(bytes) -> BlobRef`, `download(BlobRef) ->
//! bytes`, nothing else.
//!
//! Production backends (a content-addressed blob network, an object store)
//! implement [`StorageAdapter`] out of tree; [`MemoryStorage`] is the
//! in-tree content-addressed backend for tests and offline use.

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{Result, StorageError};
pub use memory::MemoryStorage;
pub use traits::StorageAdapter;
