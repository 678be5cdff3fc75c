//! In-memory container backend for nosqlayer.
//!
//! This crate provides a thread-safe, in-memory implementation of the `ContainerBackend`
//! trait. It uses async-aware read-write locks for concurrent access and is intended for
//! development and testing.
//!
//! # Features
//!
//! - **Cosmos-like items** - Writes stamp `_rid`, `_self`, `_etag`, `_attachments` and `_ts`
//! - **Partitions** - Items are keyed by partition value and id
//! - **Structured queries** - Filters, soft-delete guard, sorting, pagination, projection
//!   and `COUNT(1)` evaluated from the query definition
//! - **Paging** - Results are returned in pages with continuation tokens
//!
//! # Quick Start
//!
//! ```ignore
//! use nosqlayer_core::backend::BackendBuilder;
//! use nosqlayer_memory::InMemoryBackend;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = InMemoryBackend::builder().build().await?;
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as nosqlayer_memory;

mod evaluator;
pub mod store;

pub use store::{InMemoryBackend, InMemoryBackendBuilder};
