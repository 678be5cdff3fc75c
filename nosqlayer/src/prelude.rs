//! Convenient re-exports of commonly used types from nosqlayer.
//!
//! ```ignore
//! use nosqlayer::prelude::*;
//! ```
//!
//! This provides access to:
//! - Document traits and container handles
//! - Backend traits and builders
//! - Search expressions, query terms and the criteria parser
//! - Schemas, options and error types

pub use nosqlayer_core::{
    backend::{BackendBuilder, ClientFactory, ContainerBackend, QueryDefinition, QueryPage},
    clone::{CloneInput, CloneStatus, CloneTableStatus},
    collection::{Container, TypedContainer},
    config::ConnectionConfig,
    document::{Document, DocumentExt, Item},
    error::{DataAccessError, DataAccessResult},
    expression::{
        BinaryExpression, LogicalExpression, LogicalOperator, QueryOperator, SearchExpression,
        SearchExpressionVisitor,
    },
    options::{FindOptions, ReturnValueOption, SortDirection, SortField, UpdateResult},
    parser,
    schema::{ContainerConfiguration, FieldAliases, SchemaRegistry, StaticSchemaRegistry},
    service::{NoSqlDbService, SoftDeleteTtl},
    store::DataStore,
    term::{DataType, QueryTerm},
};
