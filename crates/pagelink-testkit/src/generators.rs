//! Proptest generators for property-based testing.

use bytes::Bytes;
use proptest::prelude::*;

use crate::fixtures::TestPayload;

/// Generate payload bytes of specified max length.
pub fn payload_bytes(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=max_len)
}

/// Generate a usable page size, small enough to force many pages.
pub fn chunk_size() -> impl Strategy<Value = usize> {
    prop_oneof![1usize..=16, 17usize..=512, Just(65_000usize)]
}

/// Generate a [`TestPayload`] with a body of up to `max_len` bytes.
pub fn test_payload(max_len: usize) -> impl Strategy<Value = TestPayload> {
    (any::<u32>(), payload_bytes(max_len)).prop_map(|(payload_num, body)| TestPayload {
        payload_num,
        body: Bytes::from(body),
    })
}
