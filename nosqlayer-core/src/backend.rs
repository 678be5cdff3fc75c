//! Backend call surface.
//!
//! A [`ContainerBackend`] is the opaque handle a data-access service drives: single-item
//! writes and reads, batch reads, and paged queries. Everything above this trait (validation,
//! aliasing, TTL derivation, query compilation) is backend independent.
//!
//! # Traits
//!
//! - [`ContainerBackend`]: item and query calls against named containers
//! - [`BackendBuilder`]: builds a backend from builder-style options
//! - [`ClientFactory`]: connects a backend from a [`ConnectionConfig`]
//!
//! # Queries
//!
//! A [`QueryDefinition`] carries the compiled query text together with the structured parts
//! it was compiled from, so SQL backends can send the text while other backends (such as the
//! in-memory one) evaluate the structure directly. Results come back one [`QueryPage`] at a
//! time; callers keep requesting pages until the continuation token is `None`.

use async_trait::async_trait;
use serde_json::Value;
use std::{fmt::Debug, sync::Arc};

use crate::{
    config::ConnectionConfig,
    document::Item,
    error::DataAccessResult,
    expression::SearchExpression,
    options::SortField,
};

/// A compiled query plus the structure it was compiled from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryDefinition {
    /// Native query text.
    pub text: String,
    /// Named parameters referenced from `text`, e.g. `@attributeValue`.
    pub parameters: Vec<(String, Value)>,
    /// Partition the query is scoped to. `None` runs across partitions.
    pub partition_value: Option<String>,
    /// Attribute the partition value is compared against.
    pub partition_key: Option<String>,
    /// Filter with stored attribute names.
    pub filter: Option<SearchExpression>,
    /// Stored attribute names to project. Empty selects every field.
    pub projection: Vec<String>,
    pub sort: Option<SortField>,
    pub skip: Option<usize>,
    pub limit: Option<usize>,
    /// Whether this is a `COUNT(1)` query.
    pub count: bool,
    /// Page size requested from the backend.
    pub max_item_count: Option<usize>,
}

impl QueryDefinition {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.push((name.into(), value));
        self
    }

    /// Looks up a named parameter.
    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// One page of query results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub items: Vec<Item>,
    /// Token for the next page; `None` once the results are exhausted.
    pub continuation: Option<String>,
}

/// Item and query calls against a backend holding named containers.
///
/// Implementations must be thread-safe; services fan out concurrent calls on one handle.
/// Failures reported by the backend itself map to
/// [`DataAccessError::Backend`](crate::error::DataAccessError::Backend) with the backend
/// status code; reads, replaces and deletes of absent items map to
/// [`DataAccessError::NotFound`](crate::error::DataAccessError::NotFound).
#[async_trait]
pub trait ContainerBackend: Send + Sync + Debug {
    /// Creates an item in the given partition and returns the stored item.
    async fn create_item(
        &self,
        container: &str,
        partition_value: &str,
        item: Item,
    ) -> DataAccessResult<Item>;

    async fn read_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
    ) -> DataAccessResult<Item>;

    /// Reads many items by `(id, partition value)`. Absent items are omitted.
    async fn read_many_items(
        &self,
        container: &str,
        keys: Vec<(String, String)>,
    ) -> DataAccessResult<Vec<Item>>;

    /// Replaces an existing item and returns the stored item.
    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        item: Item,
    ) -> DataAccessResult<Item>;

    /// Deletes an item and returns what was deleted.
    async fn delete_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
    ) -> DataAccessResult<Item>;

    /// Runs a query and returns the page following `continuation`.
    async fn query_items(
        &self,
        container: &str,
        query: &QueryDefinition,
        continuation: Option<String>,
    ) -> DataAccessResult<QueryPage>;

    /// Releases the backend's resources. The default implementation is a no-op.
    async fn shutdown(self) -> DataAccessResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
impl<B> ContainerBackend for &B
where
    B: ContainerBackend,
{
    async fn create_item(&self, container: &str, partition_value: &str, item: Item) -> DataAccessResult<Item> {
        (*self)
            .create_item(container, partition_value, item)
            .await
    }

    async fn read_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        (*self)
            .read_item(container, id, partition_value)
            .await
    }

    async fn read_many_items(&self, container: &str, keys: Vec<(String, String)>) -> DataAccessResult<Vec<Item>> {
        (*self).read_many_items(container, keys).await
    }

    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        item: Item,
    ) -> DataAccessResult<Item> {
        (*self)
            .replace_item(container, id, partition_value, item)
            .await
    }

    async fn delete_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        (*self)
            .delete_item(container, id, partition_value)
            .await
    }

    async fn query_items(
        &self,
        container: &str,
        query: &QueryDefinition,
        continuation: Option<String>,
    ) -> DataAccessResult<QueryPage> {
        (*self)
            .query_items(container, query, continuation)
            .await
    }
}

#[async_trait]
impl<B> ContainerBackend for Arc<B>
where
    B: ContainerBackend,
{
    async fn create_item(&self, container: &str, partition_value: &str, item: Item) -> DataAccessResult<Item> {
        (**self)
            .create_item(container, partition_value, item)
            .await
    }

    async fn read_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        (**self)
            .read_item(container, id, partition_value)
            .await
    }

    async fn read_many_items(&self, container: &str, keys: Vec<(String, String)>) -> DataAccessResult<Vec<Item>> {
        (**self).read_many_items(container, keys).await
    }

    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        item: Item,
    ) -> DataAccessResult<Item> {
        (**self)
            .replace_item(container, id, partition_value, item)
            .await
    }

    async fn delete_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        (**self)
            .delete_item(container, id, partition_value)
            .await
    }

    async fn query_items(
        &self,
        container: &str,
        query: &QueryDefinition,
        continuation: Option<String>,
    ) -> DataAccessResult<QueryPage> {
        (**self)
            .query_items(container, query, continuation)
            .await
    }
}

/// Builds a backend from builder-style options.
#[async_trait]
pub trait BackendBuilder {
    type Backend: ContainerBackend;

    async fn build(self) -> DataAccessResult<Self::Backend>;
}

/// Connects a backend handle from endpoint and credential settings.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Backend: ContainerBackend;

    async fn create_client(&self, config: &ConnectionConfig) -> DataAccessResult<Self::Backend>;
}
