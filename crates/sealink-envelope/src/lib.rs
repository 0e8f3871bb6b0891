//! # sealink envelope
//!
//! Envelope encryption for channel messages.
//!
//! ## Encryption Model
//!
//! Encrypted content uses a two-layer key model:
//!
//! 1. **Content Key**: a fresh symmetric key (ChaCha20-Poly1305) per message
//!    that encrypts the payload.
//! 2. **Wrap Key**: derived from the channel's key-history entry for one
//!    version; it seals the content key.
//!
//! This allows:
//! - Key rotation without re-encrypting content: old envelopes keep their
//!   version tag and resolve against the history log.
//! - The core backward-compatibility guarantee: rotation never invalidates
//!   history.
//!
//! Who may *unseal* is not decided here: the messaging client gates
//! decryption behind an Active session key, a member capability, and the
//! external policy check before opening an envelope.

pub mod crypto;
pub mod envelope;
pub mod error;
pub mod history;

pub use crypto::{EncryptionKey, EncryptionNonce};
pub use envelope::SealedEnvelope;
pub use error::{EnvelopeError, Result};
pub use history::{resolve_wrap_key, rotate};
