//! # Pagelink Testkit
//!
//! Testing utilities for pagelink.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: two paging endpoints wired over an in-process network,
//!   on either store backend
//! - **Payloads**: deterministic pseudo-random payloads of a chosen size
//! - **Generators**: Proptest strategies for property-based testing
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use pagelink_testkit::{init_tracing, PagingFixture, TestPayload};
//!
//! async fn example() {
//!     init_tracing();
//!     let fixture = PagingFixture::memory(64 * 1024).await;
//!
//!     let payload = TestPayload::new(1, 1024 * 1024);
//!     let id = fixture
//!         .helper
//!         .send_data_paged(&payload, &fixture.receiver_address)
//!         .await
//!         .unwrap();
//!     let back: TestPayload = fixture.receiver.take_data_as(id).await.unwrap();
//!     assert_eq!(back, payload);
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, PagingFixture, TestPayload};
pub use generators::{chunk_size, payload_bytes, test_payload};
