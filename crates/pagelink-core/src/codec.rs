//! Payload serialization.
//!
//! Turning a typed payload into bytes is delegated to a [`PayloadSerializer`].
//! The default is CBOR via ciborium, which round-trips any serde type.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};

/// Converts typed payloads to bytes and back.
pub trait PayloadSerializer: Send + Sync {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>>;

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

/// CBOR serializer.
///
/// Decoding reads exactly one CBOR item; trailing bytes (such as the zero
/// fill of an under-delivered buffer) are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct CborSerializer;

impl PayloadSerializer for CborSerializer {
    fn serialize<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        to_cbor(value)
    }

    fn deserialize<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        from_cbor(bytes)
    }
}

/// Encode a value as CBOR.
pub fn to_cbor<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::EncodingError(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR value.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))
}
