//! Strong type definitions for pagelink.
//!
//! Identifiers and addresses are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one in-flight transfer session.
///
/// Drawn from a bounded space (`0..=65535`) and unique only among sessions
/// that are currently active. Once a session ends its id is released and may
/// be handed to an unrelated session.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub u16);

impl SessionId {
    /// Number of distinct session ids.
    pub const SPACE: usize = u16::MAX as usize + 1;

    /// Create a session id from its raw value.
    pub const fn new(value: u16) -> Self {
        Self(value)
    }

    /// The raw numeric value.
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// The id as an index into a presence table.
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page-{}", self.0)
    }
}

impl From<u16> for SessionId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl From<SessionId> for u16 {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

/// Address of a remote endpoint, e.g. `fabric:/orders/ledger`.
///
/// Opaque to this crate; only a proxy factory interprets it.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceAddress(String);

impl ServiceAddress {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceAddress({})", self.0)
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceAddress {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ServiceAddress {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Descriptor of a payload staged for pull-mode transfer.
///
/// Returned by the sending side and handed to the consumer out of band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedSession {
    /// Session holding the staged payload on the sending side.
    pub session_id: SessionId,
    /// Length of the serialized payload in bytes.
    pub origin_data_len: u64,
    /// Where the consumer should fetch pages from, if known.
    pub origin_address: Option<ServiceAddress>,
}
