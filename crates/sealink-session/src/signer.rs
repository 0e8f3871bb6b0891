//! Challenge signer contract.
//!
//! Issuing a session key requires the wallet that owns the address to sign
//! a challenge. The wallet is an external collaborator (a browser prompt,
//! a hardware device); [`KeypairSigner`] is the in-process implementation
//! used by tests and headless tooling.

use async_trait::async_trait;
use ed25519_dalek::{Signer, SigningKey};
use rand::RngCore;

use sealink_core::Address;

use crate::error::{Result, SessionError};

/// An external signer that can approve or reject a session-key challenge.
///
/// Rejection maps to [`SessionError::SignatureDenied`]; there is no timeout
/// here beyond the signer's own latency.
#[async_trait]
pub trait ChallengeSigner: Send + Sync {
    /// The address this signer controls.
    fn address(&self) -> Address;

    /// Sign the challenge bytes, or refuse.
    async fn sign(&self, challenge: &[u8]) -> Result<Vec<u8>>;
}

/// In-process Ed25519 signer.
pub struct KeypairSigner {
    signing_key: SigningKey,
    address: Address,
}

impl KeypairSigner {
    /// Generate a signer with a random key. The address is derived from
    /// the verifying key so it stays consistent with what a wallet would
    /// report.
    pub fn generate() -> Self {
        let mut seed = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(&seed)
    }

    /// Deterministic signer from a seed, for fixtures.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(seed);
        let address = Address::from_bytes(signing_key.verifying_key().to_bytes());
        Self {
            signing_key,
            address,
        }
    }
}

#[async_trait]
impl ChallengeSigner for KeypairSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, challenge: &[u8]) -> Result<Vec<u8>> {
        Ok(self.signing_key.sign(challenge).to_bytes().to_vec())
    }
}

/// A signer that always refuses, for exercising the denial path.
pub struct DenyingSigner {
    address: Address,
}

impl DenyingSigner {
    /// Create a refusing signer for the given address.
    pub fn new(address: Address) -> Self {
        Self { address }
    }
}

#[async_trait]
impl ChallengeSigner for DenyingSigner {
    fn address(&self) -> Address {
        self.address
    }

    async fn sign(&self, _challenge: &[u8]) -> Result<Vec<u8>> {
        Err(SessionError::SignatureDenied)
    }
}
