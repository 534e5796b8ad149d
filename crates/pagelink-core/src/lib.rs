//! # Pagelink Core
//!
//! Pure primitives for paged data transfer: session ids, chunk packages and
//! payload serialization.
//!
//! This crate contains no I/O, no storage, no networking.
//!
//! ## Key Types
//!
//! - [`SessionId`] - Bounded, recyclable identifier of an in-flight transfer
//! - [`SessionIdAllocator`] - Hands out and reclaims ids for one session pool
//! - [`SenderChunkPackage`] - A serialized payload served as fixed-size pages
//! - [`ReceiverAssemblyPackage`] - Offset-addressed reassembly buffer
//! - [`PayloadSerializer`] - Typed payload <-> bytes, CBOR by default
//!
//! ## Chunking
//!
//! A payload of `len` bytes split at `chunk_size` yields pages
//! `0..=len / chunk_size`; the last page holds the remainder (possibly
//! nothing). Concatenating the pages in order reproduces the payload.

pub mod allocator;
pub mod codec;
pub mod error;
pub mod receiver;
pub mod sender;
pub mod types;

pub use allocator::SessionIdAllocator;
pub use codec::{from_cbor, to_cbor, CborSerializer, PayloadSerializer};
pub use error::{CoreError, Result};
pub use receiver::ReceiverAssemblyPackage;
pub use sender::SenderChunkPackage;
pub use types::{RequestedSession, ServiceAddress, SessionId};

/// Default page size: just under 64 KiB, below typical per-call payload limits.
pub const DEFAULT_PAGE_SIZE: usize = 65_000;
