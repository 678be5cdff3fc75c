//! Main nosqlayer crate providing a unified interface for NoSQL data access.
//!
//! This crate is the primary entry point for users of nosqlayer. It re-exports the core types
//! from the sub-crates and gives access to the available backends.
//!
//! # Features
//!
//! - **Backend-agnostic model** - Typed query terms, search expressions, find options and
//!   update return values
//! - **Search criteria parsing** - JSON criteria payloads parsed into search expressions
//! - **Cosmos SQL** - Search expressions compiled into partition-scoped Cosmos SQL queries
//! - **Generic operations** - Validated create, find, count, delete, soft delete and update
//!   with field aliasing and time-to-live derivation
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use nosqlayer::{prelude::*, cosmos::CosmosDbService, memory::InMemoryBackend};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Timer {
//!     pub id: String,
//!     pub user_id: String,
//!     pub label: String,
//! }
//!
//! impl Document for Timer {
//!     fn container_name() -> &'static str { "timers" }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = StaticSchemaRegistry::new([ContainerConfiguration::new("timers", "/userId")]);
//!     let backend = InMemoryBackend::builder().build().await?;
//!     let store = DataStore::new(CosmosDbService::new(backend, Arc::new(registry)));
//!
//!     let timers = store.typed_container::<Timer>();
//!     timers
//!         .create(vec![Timer { id: "t1".into(), user_id: "u1".into(), label: "tea".into() }])
//!         .await?;
//!
//!     let criteria = parser::parse_str(r#"{ "op": "Eq", "left": "label", "right": "tea" }"#)?
//!         .ok_or("empty criteria")?;
//!     let found = timers.find("u1", &criteria, None).await?;
//!
//!     println!("Found timers: {:?}", found);
//!     Ok(())
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - In-memory container backend for development and testing
//! - [`cosmos`] - Cosmos SQL compiler and data-access service (requires `cosmos` feature)

pub mod prelude;

pub use nosqlayer_core::{
    backend, clone, collection, config, constants, document, error, expression, options, parser, perf,
    schema, service, store, term,
};

// Re-export JSON types for convenience
pub use serde_json;

/// In-memory backend implementations.
pub mod memory {
    pub use nosqlayer_memory::{InMemoryBackend, InMemoryBackendBuilder};
}

/// Cosmos SQL compilation and the data-access service.
///
/// This module is only available when the `cosmos` feature is enabled.
#[cfg(feature = "cosmos")]
pub mod cosmos {
    pub use nosqlayer_cosmos::{CosmosDbService, QueryCompiler, query::ATTRIBUTE_VALUE_PARAMETER};
}
