//! Proptest generators for property-based testing.

use proptest::prelude::*;

use sealink_core::{Address, BlobRef, CapId, ChannelId, KeyVersion, Permission};

/// Generate a random address.
pub fn address() -> impl Strategy<Value = Address> {
    any::<[u8; 32]>().prop_map(Address::from_bytes)
}

/// Generate a random channel id.
pub fn channel_id() -> impl Strategy<Value = ChannelId> {
    any::<[u8; 32]>().prop_map(ChannelId::from_bytes)
}

/// Generate a random cap id.
pub fn cap_id() -> impl Strategy<Value = CapId> {
    any::<[u8; 32]>().prop_map(CapId::from_bytes)
}

/// Generate a random blob reference.
pub fn blob_ref() -> impl Strategy<Value = BlobRef> {
    any::<[u8; 32]>().prop_map(|bytes| BlobRef::new(hex::encode(bytes)))
}

/// Generate a key version within a realistic rotation count.
pub fn key_version() -> impl Strategy<Value = KeyVersion> {
    (1u32..=64).prop_map(KeyVersion)
}

/// Generate 32 bytes of key material.
pub fn key_bytes() -> impl Strategy<Value = Vec<u8>> {
    any::<[u8; 32]>().prop_map(|b| b.to_vec())
}

/// Generate message payload bytes up to `max_len`.
pub fn payload(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a UTF-8 message text.
pub fn message_text() -> impl Strategy<Value = String> {
    "[ -~]{1,120}".prop_map(String::from)
}

/// Generate a permission tag.
pub fn permission() -> impl Strategy<Value = Permission> {
    prop_oneof![
        Just(Permission::SendMessage),
        Just(Permission::RotateKey),
        Just(Permission::EditMembers),
    ]
}

/// Generate a fetch page size.
pub fn page_size() -> impl Strategy<Value = usize> {
    1usize..=17
}

/// Generate a reasonable timestamp.
pub fn timestamp() -> impl Strategy<Value = i64> {
    0i64..=i64::MAX / 2
}
