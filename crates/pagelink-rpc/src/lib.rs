//! # Pagelink RPC
//!
//! The remote-call boundary of pagelink: the endpoint contracts for push and
//! pull paging, their wire messages, and an in-process network.
//!
//! ## Key Types
//!
//! - [`DataPageReceiver`] - Push endpoint: begin a session, send pages
//! - [`DataPageSender`] - Pull endpoint: fetch pages, notify completion
//! - [`ProxyFactory`] - Resolves a [`ServiceAddress`] to an endpoint proxy
//! - [`MemoryNetwork`] - In-process [`ProxyFactory`] with CBOR wire encoding
//!
//! ## Message Flow
//!
//! ```text
//! Push                                Pull
//! Sender            Receiver          Consumer          Sender
//!   |-- BeginPagingData -->|            |--- GetPage(0) ---->|
//!   |<-- SessionStarted ---|            |<-- Page ----------|
//!   |-- SendDataPage ----->|            |--- GetPage(n) ---->|
//!   |<-- Ack --------------|            |<-- Page(!success) -|
//!   |        ...           |            |-- NotifyComplete ->|
//! ```
//!
//! [`ServiceAddress`]: pagelink_core::ServiceAddress

pub mod error;
pub mod messages;
pub mod service;
pub mod transport;

pub use error::{Result, RpcError};
pub use messages::{PageResponse, PagingRequest, PagingResponse, RpcErrorCode};
pub use service::{dispatch, DataPageReceiver, DataPageSender, ProxyFactory};
pub use transport::{MemoryNetwork, MemoryNetworkConfig, MemoryProxy};
