//! # sealink cache
//!
//! Generic persisted key→record store for sealink. The session-key
//! lifecycle persists its credential records through this abstraction,
//! never assuming a specific storage medium.
//!
//! ## Key Types
//!
//! - [`KeyValueCache`] - The async trait: `get` / `put` / `delete` / `scan`
//! - [`SqliteCache`] - SQLite-based persistent cache
//! - [`MemoryCache`] - In-memory cache for tests
//!
//! ## Design Notes
//!
//! - Entries are plain data, never code.
//! - TTL semantics live in the records themselves and are enforced by the
//!   layer above; the cache is deliberately dumb.

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod traits;

pub use error::{CacheError, Result};
pub use memory::MemoryCache;
pub use sqlite::SqliteCache;
pub use traits::KeyValueCache;
