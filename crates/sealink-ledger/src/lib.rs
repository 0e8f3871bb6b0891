//! # sealink ledger
//!
//! The chain boundary: typed reads of channel objects and capability-gated
//! atomic transitions, behind the [`Ledger`] trait.
//!
//! ## Key Concepts
//!
//! - **Atomic transitions**: a send appends the pointer and bumps channel
//!   counters in one step; a rotation retires and installs in one step.
//! - **Capability gating**: mutations authenticate with a [`MemberCap`]
//!   the ledger minted, never with a bare address.
//! - **Sequence numbers**: per-channel, strictly increasing, gap-free;
//!   `messages_after` is the pagination primitive everything builds on.
//!
//! [`MemoryLedger`] is the in-process reference backend used by tests.
//!
//! [`MemberCap`]: sealink_core::MemberCap

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{ChainError, Result};
pub use memory::MemoryLedger;
pub use traits::{Ledger, MessagePointer};
