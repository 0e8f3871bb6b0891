//! Client and network package configuration.

use sealink_core::Address;

/// Default session-key lifetime, in minutes.
pub const DEFAULT_SESSION_TTL_MINUTES: u32 = 30;

/// Default page size for message fetches.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// On-chain id of the testnet messaging package.
const TESTNET_PACKAGE_ID: [u8; 32] = [
    0x8f, 0x0a, 0x51, 0xc2, 0x3e, 0x77, 0x94, 0x1d, 0xab, 0x60, 0x2f, 0xe4, 0x18, 0xc5, 0x39, 0x7b,
    0x0d, 0x96, 0xaa, 0x43, 0x5c, 0xe1, 0x27, 0xf8, 0x84, 0x1b, 0x6e, 0xd0, 0x32, 0x4f, 0xc9, 0x75,
];

/// On-chain id of the mainnet messaging package.
const MAINNET_PACKAGE_ID: [u8; 32] = [
    0x41, 0xd8, 0x2c, 0x9f, 0x66, 0x03, 0xb5, 0xea, 0x17, 0x7c, 0x48, 0x91, 0xde, 0x2a, 0xb0, 0x54,
    0xf3, 0x0e, 0x85, 0x6b, 0xc7, 0x12, 0x99, 0x40, 0xd6, 0xaf, 0x23, 0x58, 0xe0, 0x7d, 0x1c, 0xb2,
];

/// Deployment coordinates of the messaging package on one network.
///
/// Bundles everything a client needs to talk to a given deployment: the
/// package id (which also scopes session keys), the capability type tag,
/// and where decrypt-policy approval is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageConfig {
    /// Network name, for logs and diagnostics.
    pub network: &'static str,
    /// The published package id. Session keys are scoped to this address.
    pub package_id: Address,
    /// Fully qualified type tag of the member capability object.
    pub member_cap_type: String,
    /// Module evaluating decrypt-policy approvals.
    pub policy_module: String,
    /// Session-key lifetime used against this deployment.
    pub session_ttl_minutes: u32,
}

impl PackageConfig {
    /// The testnet deployment.
    pub fn testnet() -> Self {
        Self::for_network("testnet", Address::from_bytes(TESTNET_PACKAGE_ID))
    }

    /// The mainnet deployment.
    pub fn mainnet() -> Self {
        Self::for_network("mainnet", Address::from_bytes(MAINNET_PACKAGE_ID))
    }

    fn for_network(network: &'static str, package_id: Address) -> Self {
        Self {
            network,
            package_id,
            member_cap_type: format!("{}::channel::MemberCap", package_id.to_hex()),
            policy_module: format!("{}::policy", package_id.to_hex()),
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
        }
    }
}

/// Configuration for a [`MessagingClient`](crate::MessagingClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// The package address session keys are scoped to.
    pub scope_package: Address,
    /// Lifetime of issued session keys, in minutes.
    pub session_ttl_minutes: u32,
    /// Maximum messages per fetched page.
    pub page_size: usize,
}

impl ClientConfig {
    /// Config with default TTL and page size for the given scope package.
    pub fn new(scope_package: Address) -> Self {
        Self {
            scope_package,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Override the fetch page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Override the session TTL.
    pub fn with_session_ttl_minutes(mut self, minutes: u32) -> Self {
        self.session_ttl_minutes = minutes;
        self
    }
}

impl From<&PackageConfig> for ClientConfig {
    fn from(package: &PackageConfig) -> Self {
        Self::new(package.package_id).with_session_ttl_minutes(package.session_ttl_minutes)
    }
}
