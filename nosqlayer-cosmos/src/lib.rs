//! Cosmos SQL backend for nosqlayer.
//!
//! This crate compiles nosqlayer search expressions into Cosmos SQL and orchestrates the
//! generic data-access operations over any `ContainerBackend`.
//!
//! To use this backend through the facade crate, keep the default `cosmos` feature:
//!
//! ```toml
//! [dependencies]
//! nosqlayer = { version = "x.y.z", features = ["cosmos"] }
//! ```
//!
//! # Features
//!
//! - **Query compilation** - Partition-scoped `SELECT` text with soft-delete guard, filter,
//!   `ORDER BY` and `OFFSET ... LIMIT`
//! - **Validation** - Batch bounds, duplicate ids, limits and criteria shape checked before
//!   any backend call
//! - **Field aliasing** - External and stored attribute names translated in both directions
//! - **Time to live** - Item expiry derived from a tick count or date attribute
//! - **Soft delete** - Deletion marker and purge scheduling
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use nosqlayer::{cosmos::CosmosDbService, memory::InMemoryBackend, prelude::*};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = StaticSchemaRegistry::new([ContainerConfiguration::new("timers", "/userId")]);
//!     let service = CosmosDbService::connect(
//!         &InMemoryBackend::builder(),
//!         &ConnectionConfig::from_env(),
//!         Arc::new(registry),
//!     )
//!     .await?;
//!
//!     Ok(())
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as nosqlayer_cosmos;

mod convert;
mod ttl;
mod validate;

pub mod query;
pub mod service;

pub use query::QueryCompiler;
pub use service::CosmosDbService;
