//! Container handles bound to a data-access service.
//!
//! - [`Container`] - untyped handle exchanging [`Item`]s
//! - [`TypedContainer`] - handle for a specific [`Document`] type
//!
//! # Example
//!
//! ```ignore
//! let timers = store.typed_container::<Timer>();
//! timers.create(vec![timer]).await?;
//! let found = timers.find_by_ids(&["t1".to_string()], "u1").await?;
//! ```

use serde_json::Value;
use std::marker::PhantomData;

use crate::{
    document::{Document, DocumentExt, Item},
    error::DataAccessResult,
    expression::SearchExpression,
    options::{FindOptions, ReturnValueOption, UpdateResult},
    service::{NoSqlDbService, SoftDeleteTtl},
};

/// An untyped container with a reference to a data-access service.
#[derive(Debug)]
pub struct Container<'a, S: NoSqlDbService> {
    name: String,
    service: &'a S,
}

impl<'a, S: NoSqlDbService> Container<'a, S> {
    pub(crate) fn new(name: String, service: &'a S) -> Self {
        Self { name, service }
    }

    /// Returns the name of this container.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn create(&self, items: Vec<Item>) -> DataAccessResult<Vec<Item>> {
        self.service.create(&self.name, items).await
    }

    pub async fn find_by_ids(&self, ids: &[String], partition_value: &str) -> DataAccessResult<Vec<Item>> {
        self.service
            .find_by_ids(&self.name, ids, partition_value)
            .await
    }

    pub async fn find(
        &self,
        partition_value: &str,
        criteria: &SearchExpression,
        options: Option<&FindOptions>,
    ) -> DataAccessResult<Vec<Item>> {
        self.service
            .find_by_search_criteria(&self.name, partition_value, Some(criteria), options)
            .await
    }

    pub async fn count(&self, partition_value: &str, criteria: Option<&SearchExpression>) -> DataAccessResult<u64> {
        self.service
            .count_by_search_criteria(&self.name, partition_value, criteria)
            .await
    }

    pub async fn delete_by_ids(&self, partition_value: &str, ids: &[String]) -> DataAccessResult<Vec<Item>> {
        self.service
            .delete_by_ids(&self.name, partition_value, ids)
            .await
    }

    /// Deletes every item of this container whose `key_attribute` equals `value`.
    pub async fn delete_by_key_value(
        &self,
        key_attribute: &str,
        value: &Value,
        batch_size: usize,
    ) -> DataAccessResult<()> {
        self.service
            .delete_by_key_value(&[self.name.clone()], key_attribute, value, batch_size)
            .await
    }

    pub async fn soft_delete(
        &self,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<()> {
        self.service
            .soft_delete_by_ids(&self.name, ids, partition_value, ttl)
            .await
    }

    pub async fn undelete(
        &self,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<Vec<Item>> {
        self.service
            .undelete_by_ids(&self.name, ids, partition_value, ttl)
            .await
    }

    pub async fn update(
        &self,
        id: &str,
        partition_value: &str,
        updates: Item,
        return_value: ReturnValueOption,
    ) -> DataAccessResult<UpdateResult> {
        self.service
            .update_by_id(&self.name, id, partition_value, updates, return_value)
            .await
    }
}

/// A container handle that converts items to and from `D`.
#[derive(Debug)]
pub struct TypedContainer<'a, S: NoSqlDbService, D: Document> {
    inner: Container<'a, S>,
    _marker: PhantomData<D>,
}

impl<'a, S: NoSqlDbService, D: Document> TypedContainer<'a, S, D> {
    pub(crate) fn new(service: &'a S) -> Self {
        Self {
            inner: Container::new(D::container_name().to_string(), service),
            _marker: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The untyped handle for operations without a typed counterpart.
    pub fn untyped(&self) -> &Container<'a, S> {
        &self.inner
    }

    pub async fn create(&self, documents: Vec<D>) -> DataAccessResult<Vec<D>> {
        let items = documents
            .iter()
            .map(DocumentExt::to_item)
            .collect::<DataAccessResult<Vec<_>>>()?;

        Self::convert(self.inner.create(items).await?)
    }

    pub async fn find_by_ids(&self, ids: &[String], partition_value: &str) -> DataAccessResult<Vec<D>> {
        Self::convert(self.inner.find_by_ids(ids, partition_value).await?)
    }

    pub async fn find(
        &self,
        partition_value: &str,
        criteria: &SearchExpression,
        options: Option<&FindOptions>,
    ) -> DataAccessResult<Vec<D>> {
        Self::convert(self.inner.find(partition_value, criteria, options).await?)
    }

    pub async fn delete_by_ids(&self, partition_value: &str, ids: &[String]) -> DataAccessResult<Vec<D>> {
        Self::convert(self.inner.delete_by_ids(partition_value, ids).await?)
    }

    fn convert(items: Vec<Item>) -> DataAccessResult<Vec<D>> {
        items.into_iter().map(D::from_item).collect()
    }
}
