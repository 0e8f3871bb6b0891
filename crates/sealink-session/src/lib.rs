//! # sealink session
//!
//! Session-key lifecycle: issuing, caching, validating, and expiring the
//! time-boxed per-address credential that authorizes decryption requests.
//!
//! ## Key Concepts
//!
//! - **SessionKey**: wallet-signed, scoped to one on-chain package, usable
//!   only while unexpired and signed (`Active`).
//! - **CachedCredentialRecord**: the format-versioned JSON snapshot
//!   persisted in the [`KeyValueCache`](sealink_cache::KeyValueCache);
//!   version mismatch means discard-unread.
//! - **Single-flight issuance**: concurrent `issue` calls for one
//!   (address, scope) share a single external signing prompt.
//!
//! ## State machine
//!
//! `Unissued → Pending (signature requested) → Active → Expired | Revoked`.
//! Only `Active` may authorize decryption; a rejected signature returns to
//! `Unissued` without caching.

pub mod clock;
pub mod error;
pub mod key;
pub mod lifecycle;
pub mod signer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, SessionError};
pub use key::{CachedCredentialRecord, ExportedSessionKey, SessionKey, CREDENTIAL_FORMAT_VERSION};
pub use lifecycle::SessionKeys;
pub use signer::{ChallengeSigner, DenyingSigner, KeypairSigner};
