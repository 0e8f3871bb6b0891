//! # sealink core
//!
//! Core primitives for sealink: strongly typed identifiers, the on-chain
//! record schema, and permission tags.
//!
//! ## Key Concepts
//!
//! - **Address**: a ledger account, `0x` + 64 hex characters.
//! - **Records**: CBOR-encoded mirrors of the ledger's channel, auth,
//!   key-history, and message-pointer objects. Their encoding is a fixed
//!   wire contract shared with the on-chain package.
//! - **MemberCap**: unforgeable proof of channel membership, minted by the
//!   ledger and required by every privileged operation.
//! - **KeyVersion**: monotonically increasing channel key version; rotation
//!   retires the old key into an append-only history.

pub mod error;
pub mod records;
pub mod types;

pub use error::CoreError;
pub use records::{
    AuthRecord, ChannelRecord, KeyHistoryRecord, MemberCap, MessageRecord, Permission,
};
pub use types::{Address, BlobRef, CapId, ChannelId, Cursor, KeyVersion};
