//! # sealink testkit
//!
//! Testing utilities for sealink.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: shared in-memory backends plus per-user clients built
//!   from deterministic keypairs, with a manual clock for exact TTL tests
//!   and a storage wrapper with injectable upload failures.
//! - **Generators**: proptest strategies for identifiers, payloads, key
//!   versions, and page sizes.
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sealink_testkit::fixtures::TestFixture;
//!
//! # async fn example() {
//! let fixture = TestFixture::new();
//! let (alice, client) = fixture.client(1);
//! let bob = TestFixture::address(2);
//! let created = client
//!     .create_channel(alice, &[bob.to_hex()])
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{FlakyStorage, TestClient, TestFixture, TEST_EPOCH_MS};
