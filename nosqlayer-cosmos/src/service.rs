use async_trait::async_trait;
use futures::{
    StreamExt, TryStreamExt,
    future::{join_all, try_join_all},
    stream::iter,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, error, warn};

use nosqlayer_core::{
    backend::{ClientFactory, ContainerBackend, QueryDefinition},
    config::ConnectionConfig,
    constants::{
        BATCH_GET_MAX, BATCH_WRITE_MAX, BULK_DELETE_BATCH_SIZE, IS_DELETED, QUERY_LIMIT_MAX, SYSTEM_FIELDS,
        TTL,
    },
    document::{Item, item_id, partition_key_string, value_at_path},
    error::{DataAccessError, DataAccessResult},
    expression::SearchExpression,
    options::{FindOptions, ReturnValueOption, UpdateResult},
    perf::{Operation, PerformanceLog},
    schema::{ContainerConfiguration, FieldAliases, SchemaRegistry},
    service::{NoSqlDbService, SoftDeleteTtl},
};

use crate::{
    convert,
    query::{PARTITION_KEY_PROJECTION, QueryCompiler},
    ttl, validate,
};

/// Data-access service over a Cosmos-style container backend.
///
/// Container schemas come from the injected [`SchemaRegistry`]; a container without a schema
/// entry fails every operation with a configuration error before the backend is called.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use nosqlayer_core::{schema::{ContainerConfiguration, StaticSchemaRegistry}, service::NoSqlDbService};
/// use nosqlayer_cosmos::CosmosDbService;
/// use nosqlayer_memory::InMemoryBackend;
///
/// let registry = StaticSchemaRegistry::new([ContainerConfiguration::new("timers", "/userId")]);
/// let service = CosmosDbService::new(InMemoryBackend::new(), Arc::new(registry));
///
/// let created = service.create("timers", vec![item]).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CosmosDbService<B: ContainerBackend> {
    backend: B,
    registry: Arc<dyn SchemaRegistry>,
}

impl<B: ContainerBackend> CosmosDbService<B> {
    pub fn new(backend: B, registry: Arc<dyn SchemaRegistry>) -> Self {
        Self { backend, registry }
    }

    /// Connects a backend through `factory` and wraps it in a service.
    pub async fn connect<F>(factory: &F, config: &ConnectionConfig, registry: Arc<dyn SchemaRegistry>) -> DataAccessResult<Self>
    where
        F: ClientFactory<Backend = B>,
    {
        config.validate()?;

        Ok(Self::new(factory.create_client(config).await?, registry))
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn registry(&self) -> &dyn SchemaRegistry {
        self.registry.as_ref()
    }

    pub async fn shutdown(self) -> DataAccessResult<()> {
        self.backend.shutdown().await
    }

    fn schema(&self, container: &str, operation: Operation) -> DataAccessResult<&ContainerConfiguration> {
        self.registry.resolve(container, operation)
    }

    /// Logs a failed backend call once and hands the result back.
    fn logged<T>(result: DataAccessResult<T>, operation: Operation, container: &str) -> DataAccessResult<T> {
        result.inspect_err(|err| {
            error!(%operation, container, status = ?err.status(), error = %err, "backend call failed");
        })
    }

    /// Derives the TTL, renames to stored attributes and extracts the partition value.
    fn prepare_for_create(
        schema: &ContainerConfiguration,
        aliases: &FieldAliases,
        mut item: Item,
    ) -> DataAccessResult<(String, Item)> {
        if let Some(attribute) = schema.ttl_attribute() {
            if let Some(seconds) = ttl::derive(&item, attribute)? {
                item.insert(TTL.into(), json!(seconds));
            }
        }

        let stored = aliases.to_stored(&item);
        let partition_value = value_at_path(&stored, schema.partition_key_path())
            .and_then(partition_key_string)
            .ok_or_else(|| {
                DataAccessError::Validation(format!(
                    "Item is missing a value for partition key '{}'.",
                    schema.partition_key_path()
                ))
            })?;

        Ok((partition_value, stored))
    }

    /// Reads every page of a query.
    async fn collect_pages(&self, container: &str, query: &QueryDefinition) -> DataAccessResult<Vec<Item>> {
        let mut items = Vec::new();
        let mut continuation = None;

        loop {
            let page = self
                .backend
                .query_items(container, query, continuation)
                .await?;

            items.extend(page.items);
            continuation = page.continuation;

            if continuation.is_none() {
                break;
            }
        }

        Ok(items)
    }

    /// Sets or clears the deletion marker on each item, aborting on the first failure.
    async fn mark_deleted(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
        deleted: bool,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<Vec<Item>> {
        let operation = Operation::Update;
        validate::ensure_not_empty(ids, operation)?;
        self.schema(container, operation)?;

        let updated = try_join_all(ids.iter().map(|id| async move {
            let mut item = self.backend.read_item(container, id, partition_value).await?;

            item.insert(IS_DELETED.into(), Value::Bool(deleted));
            match (deleted, ttl) {
                (true, Some(ttl)) => {
                    item.insert(TTL.into(), json!(ttl.as_seconds()));
                }
                (false, Some(_)) => {
                    item.remove(TTL);
                }
                _ => {}
            }

            self.backend
                .replace_item(container, id, partition_value, convert::strip_system_fields(item))
                .await
        }))
        .await;

        Self::logged(updated, operation, container)
    }

    /// Deletes every item of one container whose `key_attribute` equals `value`.
    async fn delete_matching(
        &self,
        schema: &ContainerConfiguration,
        key_attribute: &str,
        value: &Value,
        batch_size: usize,
    ) -> DataAccessResult<usize> {
        let container = schema.container_name.as_str();
        let query = QueryDefinition {
            max_item_count: Some(batch_size),
            ..QueryCompiler::new(schema).key_value(key_attribute, value)?
        };
        let fallback = partition_key_string(value);
        let mut deleted = 0;

        loop {
            let page = self.backend.query_items(container, &query, None).await?;
            if page.items.is_empty() {
                break;
            }

            for chunk in page.items.chunks(batch_size) {
                let keys = chunk
                    .iter()
                    .map(|item| {
                        let id = item_id(item).ok_or_else(|| {
                            DataAccessError::backend(500, format!("query on {container} returned an item without id"))
                        })?;
                        let partition_value = item
                            .get(PARTITION_KEY_PROJECTION)
                            .and_then(partition_key_string)
                            .or_else(|| fallback.clone())
                            .ok_or_else(|| {
                                DataAccessError::Validation(format!(
                                    "Item {id} in {container} has no partition key value."
                                ))
                            })?;

                        Ok::<_, DataAccessError>((id.to_string(), partition_value))
                    })
                    .collect::<DataAccessResult<Vec<_>>>()?;

                try_join_all(
                    keys.iter()
                        .map(|(id, partition_value)| self.backend.delete_item(container, id, partition_value)),
                )
                .await?;

                deleted += keys.len();
            }

            debug!(container, key_attribute, deleted, "deleted batch by key value");
        }

        Ok(deleted)
    }
}

#[async_trait]
impl<B: ContainerBackend> NoSqlDbService for CosmosDbService<B> {
    async fn create(&self, container: &str, items: Vec<Item>) -> DataAccessResult<Vec<Item>> {
        let perf = PerformanceLog::start(Operation::Insert, container);

        validate::ensure_batch(&items, BATCH_WRITE_MAX, perf.operation())?;
        let schema = self.schema(container, perf.operation())?;
        let aliases = schema.field_aliases();

        let prepared = items
            .into_iter()
            .map(|item| Self::prepare_for_create(schema, &aliases, item))
            .collect::<DataAccessResult<Vec<_>>>()?;

        let created = iter(prepared.into_iter().enumerate())
            .map(|(index, (partition_value, item))| async move {
                self.backend
                    .create_item(container, &partition_value, item)
                    .await
                    .map(|stored| (index, stored))
            })
            .buffer_unordered(BATCH_WRITE_MAX)
            .try_collect::<Vec<_>>()
            .await;

        let mut created = Self::logged(created, perf.operation(), container)?;
        created.sort_by_key(|(index, _)| *index);

        let result = created
            .into_iter()
            .map(|(_, item)| convert::to_external(item, &aliases))
            .collect::<Vec<_>>();

        perf.finish(result.len());
        Ok(result)
    }

    async fn find_by_ids(&self, container: &str, ids: &[String], partition_value: &str) -> DataAccessResult<Vec<Item>> {
        let perf = PerformanceLog::start(Operation::Query, container);

        validate::ensure_batch(ids, BATCH_GET_MAX, perf.operation())?;
        validate::ensure_unique(ids, perf.operation(), container)?;
        let schema = self.schema(container, perf.operation())?;
        let aliases = schema.field_aliases();

        let keys = ids
            .iter()
            .map(|id| (id.clone(), partition_value.to_string()))
            .collect();
        let found = Self::logged(
            self.backend.read_many_items(container, keys).await,
            perf.operation(),
            container,
        )?;

        let result = found
            .into_iter()
            .map(|item| convert::to_external(item, &aliases))
            .collect::<Vec<_>>();

        perf.finish(result.len());
        Ok(result)
    }

    async fn find_by_search_criteria(
        &self,
        container: &str,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
        options: Option<&FindOptions>,
    ) -> DataAccessResult<Vec<Item>> {
        let perf = PerformanceLog::start(Operation::Query, container);

        validate::ensure_partition_value(partition_value)?;
        let criteria = criteria.ok_or_else(|| DataAccessError::Validation("Search criteria cannot be null.".into()))?;
        criteria.validate()?;

        if options
            .and_then(|options| options.limit)
            .is_some_and(|limit| limit > QUERY_LIMIT_MAX)
        {
            return Err(DataAccessError::Validation(format!(
                "Limit cannot exceed the maximum allowed value of {QUERY_LIMIT_MAX}."
            )));
        }

        let schema = self.schema(container, perf.operation())?;
        let aliases = schema.field_aliases();
        let query = QueryCompiler::new(schema).find(partition_value, Some(criteria), options)?;

        debug!(container, query = %query.text, "running search");

        let found = Self::logged(
            self.collect_pages(container, &query).await,
            perf.operation(),
            container,
        )?;

        let result = found
            .into_iter()
            .map(|item| convert::to_external(item, &aliases))
            .collect::<Vec<_>>();

        perf.finish(result.len());
        Ok(result)
    }

    async fn count_by_search_criteria(
        &self,
        container: &str,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
    ) -> DataAccessResult<u64> {
        let perf = PerformanceLog::start(Operation::Query, container);

        validate::ensure_partition_value(partition_value)?;
        if let Some(criteria) = criteria {
            criteria.validate()?;
        }

        let schema = self.schema(container, perf.operation())?;
        let query = QueryCompiler::new(schema).count(partition_value, criteria)?;

        debug!(container, query = %query.text, "running count");

        let rows = Self::logged(
            self.collect_pages(container, &query).await,
            perf.operation(),
            container,
        )?;

        let count = rows
            .iter()
            .filter_map(|row| row.get("$1").and_then(Value::as_u64))
            .sum();

        perf.finish(rows.len());
        Ok(count)
    }

    async fn delete_by_ids(&self, container: &str, partition_value: &str, ids: &[String]) -> DataAccessResult<Vec<Item>> {
        let perf = PerformanceLog::start(Operation::Delete, container);

        validate::ensure_batch(ids, BATCH_WRITE_MAX, perf.operation())?;
        let schema = self.schema(container, perf.operation())?;
        let aliases = schema.field_aliases();

        let outcomes = join_all(
            ids.iter()
                .map(|id| self.backend.delete_item(container, id, partition_value)),
        )
        .await;

        let result = ids
            .iter()
            .zip(outcomes)
            .filter_map(|(id, outcome)| match outcome {
                Ok(item) => Some(convert::to_external(item, &aliases)),
                Err(err @ DataAccessError::NotFound { .. }) => {
                    warn!(container, id = %id, error = %err, "item to delete was not found");
                    None
                }
                Err(err) => {
                    error!(container, id = %id, status = ?err.status(), error = %err, "failed to delete item");
                    None
                }
            })
            .collect::<Vec<_>>();

        perf.finish(result.len());
        Ok(result)
    }

    async fn delete_by_key_value(
        &self,
        containers: &[String],
        key_attribute: &str,
        value: &Value,
        batch_size: usize,
    ) -> DataAccessResult<()> {
        validate::ensure_not_empty(containers, Operation::Delete)?;
        let batch_size = if batch_size == 0 { BULK_DELETE_BATCH_SIZE } else { batch_size };

        let schemas = containers
            .iter()
            .map(|container| self.schema(container, Operation::Delete))
            .collect::<DataAccessResult<Vec<_>>>()?;

        for schema in schemas {
            let perf = PerformanceLog::start(Operation::Delete, schema.container_name.as_str());
            let deleted = Self::logged(
                self.delete_matching(schema, key_attribute, value, batch_size).await,
                perf.operation(),
                &schema.container_name,
            )?;
            perf.finish(deleted);
        }

        Ok(())
    }

    async fn soft_delete_by_ids(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<()> {
        let perf = PerformanceLog::start(Operation::Update, container);
        let updated = self
            .mark_deleted(container, ids, partition_value, true, ttl)
            .await?;

        perf.finish(updated.len());
        Ok(())
    }

    async fn undelete_by_ids(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<Vec<Item>> {
        let perf = PerformanceLog::start(Operation::Update, container);
        let updated = self
            .mark_deleted(container, ids, partition_value, false, ttl)
            .await?;

        let aliases = self.schema(container, perf.operation())?.field_aliases();
        let result = updated
            .into_iter()
            .map(|item| convert::to_external(item, &aliases))
            .collect::<Vec<_>>();

        perf.finish(result.len());
        Ok(result)
    }

    async fn update_by_id(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        updates: Item,
        return_value: ReturnValueOption,
    ) -> DataAccessResult<UpdateResult> {
        let perf = PerformanceLog::start(Operation::Update, container);

        if id.trim().is_empty() {
            return Err(DataAccessError::Validation("Id cannot be null or empty.".into()));
        }
        let schema = self.schema(container, perf.operation())?;
        let aliases = schema.field_aliases();

        let old = Self::logged(
            self.backend.read_item(container, id, partition_value).await,
            perf.operation(),
            container,
        )?;

        let mut replacement = convert::strip_system_fields(old.clone());
        for (key, value) in aliases.to_stored(&updates) {
            if !SYSTEM_FIELDS.contains(&key.as_str()) {
                replacement.insert(key, value);
            }
        }

        debug!(container, id, native_return_value = ?return_value.native(), "replacing item");

        let new = Self::logged(
            self.backend
                .replace_item(container, id, partition_value, replacement)
                .await,
            perf.operation(),
            container,
        )?;

        perf.finish(1);
        Ok(return_value.resolve(
            convert::to_external(old, &aliases),
            convert::to_external(new, &aliases),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nosqlayer_core::{
        backend::BackendBuilder,
        clone::CloneInput,
        options::SortDirection,
        parser,
        schema::StaticSchemaRegistry,
    };
    use nosqlayer_memory::InMemoryBackend;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    async fn service(page_size: usize) -> CosmosDbService<InMemoryBackend> {
        let registry = StaticSchemaRegistry::new([
            ContainerConfiguration::new("timers", "/userId")
                .with_alias("timerId", "id")
                .with_time_to_live("expiresAt"),
            ContainerConfiguration::new("notes", "/userId"),
            ContainerConfiguration::new("events", "/owner/id"),
        ]);
        let backend = InMemoryBackend::builder()
            .page_size(page_size)
            .build()
            .await
            .unwrap();

        CosmosDbService::new(backend, Arc::new(registry))
    }

    async fn seed_notes(service: &CosmosDbService<InMemoryBackend>) {
        service
            .create(
                "notes",
                vec![
                    item(json!({ "id": "n1", "userId": "u1", "title": "b", "rank": 2 })),
                    item(json!({ "id": "n2", "userId": "u1", "title": "a", "rank": 1 })),
                    item(json!({ "id": "n3", "userId": "u1", "title": "c", "rank": 3 })),
                    item(json!({ "id": "n4", "userId": "u2", "title": "d", "rank": 4 })),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_should_create_and_return_external_items_in_order() {
        let service = service(100).await;
        let created = service
            .create(
                "timers",
                (0..10)
                    .map(|n| item(json!({ "timerId": format!("t{n}"), "userId": "u1" })))
                    .collect(),
            )
            .await
            .unwrap();

        assert_eq!(created.len(), 10);
        for (n, timer) in created.iter().enumerate() {
            assert_eq!(timer.get("timerId"), Some(&json!(format!("t{n}"))));
            assert!(!timer.contains_key("id"));
            assert!(!timer.contains_key("_etag"));
        }

        let stored = service.backend().read_item("timers", "t3", "u1").await.unwrap();
        assert_eq!(stored.get("id"), Some(&json!("t3")));
    }

    #[tokio::test]
    async fn test_should_derive_ttl_from_future_date() {
        let service = service(100).await;
        let created = service
            .create(
                "timers",
                vec![item(json!({
                    "timerId": "t1",
                    "userId": "u1",
                    "expiresAt": "2030-01-01T00:00:00Z"
                }))],
            )
            .await
            .unwrap();

        assert_eq!(created[0].get(TTL), Some(&json!(1_893_456_000)));
        let stored = service.backend().read_item("timers", "t1", "u1").await.unwrap();
        assert_eq!(stored.get(TTL), Some(&json!(1_893_456_000)));
    }

    #[tokio::test]
    async fn test_should_reject_invalid_create_input() {
        let service = service(100).await;

        assert!(matches!(service.create("timers", vec![]).await, Err(DataAccessError::Validation(_))));

        let too_many = (0..26)
            .map(|n| item(json!({ "timerId": format!("t{n}"), "userId": "u1" })))
            .collect();
        assert!(matches!(service.create("timers", too_many).await, Err(DataAccessError::Validation(_))));

        let bad_ttl = vec![item(json!({ "timerId": "t1", "userId": "u1", "expiresAt": true }))];
        assert!(matches!(service.create("timers", bad_ttl).await, Err(DataAccessError::Validation(_))));

        let no_partition = vec![item(json!({ "timerId": "t1" }))];
        assert!(matches!(service.create("timers", no_partition).await, Err(DataAccessError::Validation(_))));

        let unknown = vec![item(json!({ "id": "x", "userId": "u1" }))];
        assert!(matches!(service.create("missing", unknown).await, Err(DataAccessError::Configuration(_))));
        assert_eq!(service.backend().len("timers").await, 0);
    }

    #[tokio::test]
    async fn test_should_fail_create_on_conflict() {
        let service = service(100).await;
        seed_notes(&service).await;

        let err = service
            .create("notes", vec![item(json!({ "id": "n1", "userId": "u1" }))])
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn test_should_use_nested_partition_key_path() {
        let service = service(100).await;
        service
            .create("events", vec![item(json!({ "id": "e1", "owner": { "id": "o1" } }))])
            .await
            .unwrap();

        let found = service.find_by_ids("events", &ids(&["e1"]), "o1").await.unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn test_should_delete_by_key_value_with_nested_partition_key() {
        let service = service(100).await;
        service
            .create(
                "events",
                vec![
                    item(json!({ "id": "e1", "owner": { "id": "o1" }, "kind": "ping" })),
                    item(json!({ "id": "e2", "owner": { "id": "o2" }, "kind": "ping" })),
                    item(json!({ "id": "e3", "owner": { "id": "o2" }, "kind": "pong" })),
                ],
            )
            .await
            .unwrap();

        service
            .delete_by_key_value(&ids(&["events"]), "kind", &json!("ping"), 1)
            .await
            .unwrap();

        assert_eq!(service.backend().len("events").await, 1);
        assert_eq!(service.find_by_ids("events", &ids(&["e3"]), "o2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_should_find_by_ids() {
        let service = service(100).await;
        seed_notes(&service).await;

        let found = service
            .find_by_ids("notes", &ids(&["n1", "n3", "n4"]), "u1")
            .await
            .unwrap();
        assert_eq!(found.len(), 2);

        let err = service
            .find_by_ids("notes", &ids(&["n1", "n1"]), "u1")
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::DuplicateKey(_)));

        let too_many = (0..101).map(|n| format!("n{n}")).collect::<Vec<_>>();
        assert!(matches!(
            service.find_by_ids("notes", &too_many, "u1").await,
            Err(DataAccessError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_should_search_across_pages_with_sort() {
        let service = service(2).await;
        seed_notes(&service).await;

        let criteria = parser::parse(&json!({ "op": "Gte", "left": "rank", "right": 1 }))
            .unwrap()
            .unwrap();
        let options = FindOptions::builder()
            .sort("title", SortDirection::Ascending)
            .build();

        let found = service
            .find_by_search_criteria("notes", "u1", Some(&criteria), Some(&options))
            .await
            .unwrap();

        let titles = found
            .iter()
            .filter_map(|note| note.get("title").and_then(Value::as_str))
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_should_validate_search_input() {
        let service = service(100).await;
        let criteria = SearchExpression::eq("title", "a");

        assert!(matches!(
            service.find_by_search_criteria("notes", "u1", None, None).await,
            Err(DataAccessError::Validation(_))
        ));
        assert!(matches!(
            service.find_by_search_criteria("notes", " ", Some(&criteria), None).await,
            Err(DataAccessError::Validation(_))
        ));
        assert!(matches!(
            service
                .find_by_search_criteria("notes", "u1", Some(&SearchExpression::and(Vec::new())), None)
                .await,
            Err(DataAccessError::Validation(_))
        ));

        let over_limit = FindOptions::builder().limit(501).build();
        assert!(matches!(
            service
                .find_by_search_criteria("notes", "u1", Some(&criteria), Some(&over_limit))
                .await,
            Err(DataAccessError::Validation(_))
        ));

        let at_limit = FindOptions::builder().limit(500).build();
        assert!(service
            .find_by_search_criteria("notes", "u1", Some(&criteria), Some(&at_limit))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_should_count_matching_items() {
        let service = service(2).await;
        seed_notes(&service).await;

        assert_eq!(service.count_by_search_criteria("notes", "u1", None).await.unwrap(), 3);
        assert_eq!(
            service
                .count_by_search_criteria("notes", "u1", Some(&SearchExpression::gt("rank", 1)))
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_should_drop_failed_deletes_and_keep_order() {
        let service = service(100).await;
        seed_notes(&service).await;

        let deleted = service
            .delete_by_ids("notes", "u1", &ids(&["n3", "missing", "n1"]))
            .await
            .unwrap();

        let deleted_ids = deleted.iter().filter_map(item_id).collect::<Vec<_>>();
        assert_eq!(deleted_ids, vec!["n3", "n1"]);
        assert_eq!(service.backend().len("notes").await, 2);
    }

    #[tokio::test]
    async fn test_should_delete_by_key_value_across_containers() {
        let service = service(2).await;
        seed_notes(&service).await;
        service
            .create(
                "timers",
                vec![
                    item(json!({ "timerId": "t1", "userId": "u1", "tenant": "acme" })),
                    item(json!({ "timerId": "t2", "userId": "u2", "tenant": "other" })),
                ],
            )
            .await
            .unwrap();
        for (id, tenant) in [("n1", "acme"), ("n2", "acme"), ("n3", "acme")] {
            service
                .update_by_id("notes", id, "u1", item(json!({ "tenant": tenant })), ReturnValueOption::None)
                .await
                .unwrap();
        }

        service
            .delete_by_key_value(&ids(&["notes", "timers"]), "tenant", &json!("acme"), 2)
            .await
            .unwrap();

        assert_eq!(service.backend().len("notes").await, 1);
        assert_eq!(service.backend().len("timers").await, 1);

        let err = service
            .delete_by_key_value(&ids(&["notes", "missing"]), "tenant", &json!("acme"), 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_should_soft_delete_and_undelete() {
        let service = service(100).await;
        seed_notes(&service).await;
        let not_deleted = SearchExpression::and([
            SearchExpression::not_deleted(),
            SearchExpression::gte("rank", 0),
        ]);

        service
            .soft_delete_by_ids("notes", &ids(&["n1", "n2"]), "u1", Some(&SoftDeleteTtl::days(2)))
            .await
            .unwrap();

        let stored = service.backend().read_item("notes", "n1", "u1").await.unwrap();
        assert_eq!(stored.get(IS_DELETED), Some(&json!(true)));
        assert_eq!(stored.get(TTL), Some(&json!(172_800)));

        let visible = service
            .find_by_search_criteria("notes", "u1", Some(&not_deleted), None)
            .await
            .unwrap();
        assert_eq!(visible.len(), 1);

        let restored = service
            .undelete_by_ids("notes", &ids(&["n1"]), "u1", Some(&SoftDeleteTtl::days(2)))
            .await
            .unwrap();
        assert_eq!(restored[0].get(IS_DELETED), Some(&json!(false)));
        assert!(!restored[0].contains_key(TTL));
        assert!(!restored[0].contains_key("_rid"));

        assert!(matches!(
            service.soft_delete_by_ids("notes", &ids(&["n3", "zz"]), "u1", None).await,
            Err(DataAccessError::NotFound { .. })
        ));
        assert!(matches!(
            service.soft_delete_by_ids("notes", &[], "u1", None).await,
            Err(DataAccessError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_should_update_and_resolve_return_values() {
        let service = service(100).await;
        service
            .create("timers", vec![item(json!({ "timerId": "t1", "userId": "u1", "label": "old" }))])
            .await
            .unwrap();

        let result = service
            .update_by_id(
                "timers",
                "t1",
                "u1",
                item(json!({ "label": "new", "note": "added" })),
                ReturnValueOption::AllOldNew,
            )
            .await
            .unwrap();

        let old = result.old.unwrap();
        let new = result.new.unwrap();
        assert_eq!(old.get("label"), Some(&json!("old")));
        assert_eq!(new.get("label"), Some(&json!("new")));
        assert_eq!(new.get("note"), Some(&json!("added")));
        assert_eq!(new.get("timerId"), Some(&json!("t1")));

        let result = service
            .update_by_id("timers", "t1", "u1", item(json!({ "label": "x" })), ReturnValueOption::UpdatedOld)
            .await
            .unwrap();
        assert!(result.new.is_none());
        assert_eq!(result.old.unwrap().get("label"), Some(&json!("new")));

        assert!(matches!(
            service
                .update_by_id("timers", "zz", "u1", Item::new(), ReturnValueOption::None)
                .await,
            Err(DataAccessError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_should_report_clone_as_unsupported() {
        let service = service(100).await;
        let err = service
            .clone_by_key_value(Some(CloneInput::new(ids(&["notes"]))), "tenant", &json!("a"), &json!("b"))
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::NotSupported(_)));
    }
}
