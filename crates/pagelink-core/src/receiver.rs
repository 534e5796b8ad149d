//! Receiver side of a push transfer.
//!
//! Chunks carry no sequence number: each one is written at the current
//! offset, so they must arrive in the order the sender produced them.

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

/// Fixed-size reassembly buffer filled by successive chunks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiverAssemblyPackage {
    data: BytesMut,
    position: usize,
}

impl ReceiverAssemblyPackage {
    /// Preallocate a zeroed buffer of the expected payload length.
    pub fn new(expected_len: usize) -> Self {
        Self {
            data: BytesMut::zeroed(expected_len),
            position: 0,
        }
    }

    /// Append a chunk at the current offset.
    ///
    /// Bytes that would run past the end of the buffer are dropped.
    pub fn add_data(&mut self, chunk: &[u8]) {
        let len = chunk.len().min(self.remaining());
        self.data[self.position..self.position + len].copy_from_slice(&chunk[..len]);
        self.position += len;
    }

    /// The whole buffer, including any not-yet-written tail.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data.to_vec()
    }

    /// Number of bytes written so far.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn expected_len(&self) -> usize {
        self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.position
    }
}
