//! A vendor-abstracted NoSQL data-access layer.
//!
//! This crate is the backend-independent core of the nosqlayer project and provides:
//!
//! - **Query terms** ([`term`]) - Typed literal values with explicit, checked accessors
//! - **Search expressions** ([`expression`]) - The filter AST and its visitor trait
//! - **Parser** ([`parser`]) - JSON search criteria to search expressions
//! - **Options** ([`options`]) - Find options and update return-value resolution
//! - **Schemas** ([`schema`]) - Container configurations, field aliases and the schema registry
//! - **Backend abstraction** ([`backend`]) - The call surface a data-access service drives
//! - **Service contract** ([`service`]) - The generic data-access operations
//! - **Container handles** ([`collection`], [`store`]) - Typed and untyped container access
//! - **Error handling** ([`error`]) - Error taxonomy and result type
//! - **Configuration and diagnostics** ([`config`], [`perf`])
//!
//! # Example
//!
//! ```ignore
//! use nosqlayer_core::{parser, expression::SearchExpression};
//! use serde_json::json;
//!
//! let criteria = parser::parse(&json!({
//!     "op": "And",
//!     "searchTerms": [
//!         { "op": "Eq", "left": "status", "right": "active" },
//!         { "op": "Gte", "left": "createdAt", "right": "2024-01-01T00:00:00Z" }
//!     ]
//! }))?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as nosqlayer_core;

pub mod backend;
pub mod clone;
pub mod collection;
pub mod config;
pub mod constants;
pub mod document;
pub mod error;
pub mod expression;
pub mod options;
pub mod parser;
pub mod perf;
pub mod schema;
pub mod service;
pub mod store;
pub mod term;
