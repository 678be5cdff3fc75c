//! In-memory implementation of the container backend.
//!
//! Items are kept per container, keyed by `(partition value, id)`, behind an async-aware
//! read-write lock. The backend behaves like a Cosmos container where it matters to the
//! layers above: writes stamp system fields, duplicate creates conflict, and queries come
//! back in pages with continuation tokens.

use async_trait::async_trait;
use chrono::Utc;
use mea::rwlock::RwLock;
use serde_json::{Value, json};
use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};
use tracing::debug;
use uuid::Uuid;

use nosqlayer_core::{
    backend::{BackendBuilder, ClientFactory, ContainerBackend, QueryDefinition, QueryPage},
    config::ConnectionConfig,
    constants::ID,
    document::{Item, item_id},
    error::{DataAccessError, DataAccessResult},
    options::SortDirection,
};

use crate::evaluator::{Comparable, ItemEvaluator, lookup};

/// Default number of items returned per query page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

type ContainerMap = BTreeMap<(String, String), Item>;
type StoreMap = HashMap<String, ContainerMap>;

/// Thread-safe in-memory container backend.
///
/// `InMemoryBackend` is cloneable; clones share the same underlying data, so a test can keep
/// one handle for inspection while a service owns another.
///
/// # Example
///
/// ```ignore
/// use nosqlayer_memory::InMemoryBackend;
/// use nosqlayer_core::backend::{BackendBuilder, ContainerBackend};
///
/// let backend = InMemoryBackend::builder().page_size(10).build().await?;
/// let stored = backend.create_item("timers", "u1", item).await?;
/// assert!(stored.contains_key("_etag"));
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    store: Arc<RwLock<StoreMap>>,
    page_size: usize,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// Creates a new empty backend with the default page size.
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
            page_size: page_size.max(1),
        }
    }

    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::default()
    }

    /// Number of items currently held by a container.
    pub async fn len(&self, container: &str) -> usize {
        self.store
            .read()
            .await
            .get(container)
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn stamp_system_fields(container: &str, item: &mut Item) {
        let rid = Uuid::new_v4().simple().to_string();

        item.insert("_self".into(), json!(format!("dbs/memory/colls/{container}/docs/{rid}")));
        item.insert("_rid".into(), json!(rid));
        item.insert("_etag".into(), json!(format!("\"{}\"", Uuid::new_v4())));
        item.insert("_attachments".into(), json!("attachments/"));
        item.insert("_ts".into(), json!(Utc::now().timestamp()));
    }

    fn not_found(container: &str, id: &str) -> DataAccessError {
        DataAccessError::NotFound {
            id: id.to_string(),
            container: container.to_string(),
        }
    }

    fn project(item: &Item, fields: &[String]) -> Item {
        if fields.is_empty() || fields.iter().any(|field| field.contains('*')) {
            return item.clone();
        }

        let mut projected = Item::new();
        for field in fields {
            let (path, name) = field.split_once(" AS ").unwrap_or((field.as_str(), field.as_str()));
            if let Some(value) = lookup(item, path) {
                Self::insert_at(&mut projected, name, value.clone());
            }
        }
        projected
    }

    /// Inserts `value` at a dotted path, creating intermediate objects.
    fn insert_at(target: &mut Item, path: &str, value: Value) {
        match path.split_once('.') {
            None => {
                target.insert(path.to_string(), value);
            }
            Some((head, rest)) => {
                if let Value::Object(child) = target
                    .entry(head)
                    .or_insert_with(|| Value::Object(Item::new()))
                {
                    Self::insert_at(child, rest, value);
                }
            }
        }
    }

    fn compare(a: &Item, b: &Item, field: &str) -> Ordering {
        let left = lookup(a, field).map(Comparable::from).unwrap_or(Comparable::Null);
        let right = lookup(b, field).map(Comparable::from).unwrap_or(Comparable::Null);

        match (&left, &right) {
            (Comparable::Null, Comparable::Null) => Ordering::Equal,
            (Comparable::Null, _) => Ordering::Less,
            (_, Comparable::Null) => Ordering::Greater,
            _ => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
        }
    }

    fn parse_continuation(token: Option<String>) -> DataAccessResult<usize> {
        match token {
            None => Ok(0),
            Some(token) => token.parse::<usize>().map_err(|_| {
                DataAccessError::backend(400, format!("invalid continuation token '{token}'"))
            }),
        }
    }
}

#[async_trait]
impl ContainerBackend for InMemoryBackend {
    async fn create_item(&self, container: &str, partition_value: &str, mut item: Item) -> DataAccessResult<Item> {
        let id = item_id(&item)
            .ok_or_else(|| DataAccessError::backend(400, "item is missing a string 'id'"))?
            .to_string();

        let mut store = self.store.write().await;
        let container_map = store
            .entry(container.to_string())
            .or_default();

        let key = (partition_value.to_string(), id);
        if container_map.contains_key(&key) {
            return Err(DataAccessError::backend(
                409,
                format!("item {} already exists in container {container}", key.1),
            ));
        }

        Self::stamp_system_fields(container, &mut item);
        container_map.insert(key, item.clone());

        Ok(item)
    }

    async fn read_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        self.store
            .read()
            .await
            .get(container)
            .and_then(|items| items.get(&(partition_value.to_string(), id.to_string())))
            .cloned()
            .ok_or_else(|| Self::not_found(container, id))
    }

    async fn read_many_items(&self, container: &str, keys: Vec<(String, String)>) -> DataAccessResult<Vec<Item>> {
        let store = self.store.read().await;
        let Some(container_map) = store.get(container) else {
            return Ok(vec![]);
        };

        Ok(keys
            .into_iter()
            .filter_map(|(id, partition_value)| container_map.get(&(partition_value, id)).cloned())
            .collect())
    }

    async fn replace_item(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        mut item: Item,
    ) -> DataAccessResult<Item> {
        let mut store = self.store.write().await;
        let existing = store
            .get_mut(container)
            .and_then(|items| items.get_mut(&(partition_value.to_string(), id.to_string())))
            .ok_or_else(|| Self::not_found(container, id))?;

        item.insert(ID.into(), json!(id));
        Self::stamp_system_fields(container, &mut item);
        *existing = item.clone();

        Ok(item)
    }

    async fn delete_item(&self, container: &str, id: &str, partition_value: &str) -> DataAccessResult<Item> {
        self.store
            .write()
            .await
            .get_mut(container)
            .and_then(|items| items.remove(&(partition_value.to_string(), id.to_string())))
            .ok_or_else(|| Self::not_found(container, id))
    }

    async fn query_items(
        &self,
        container: &str,
        query: &QueryDefinition,
        continuation: Option<String>,
    ) -> DataAccessResult<QueryPage> {
        let offset = Self::parse_continuation(continuation)?;

        let scoped = {
            let store = self.store.read().await;
            let Some(container_map) = store.get(container) else {
                return Ok(QueryPage::default());
            };

            ItemEvaluator::filter_items(
                container_map
                    .iter()
                    .filter(|((partition, _), _)| {
                        query
                            .partition_value
                            .as_ref()
                            .is_none_or(|value| value == partition)
                    })
                    .map(|(_, item)| item),
                query.filter.as_ref(),
            )?
        };

        debug!(container, query = %query.text, matched = scoped.len(), "evaluated in-memory query");

        if query.count {
            return Ok(QueryPage {
                items: vec![json!({ "$1": scoped.len() })
                    .as_object()
                    .cloned()
                    .unwrap_or_default()],
                continuation: None,
            });
        }

        let mut results = scoped;
        if let Some(sort) = &query.sort {
            results.sort_by(|a, b| match sort.sort_direction {
                SortDirection::Ascending => Self::compare(a, b, &sort.field_name),
                SortDirection::Descending => Self::compare(b, a, &sort.field_name),
            });
        }

        let results = results
            .into_iter()
            .skip(query.skip.unwrap_or(0))
            .take(query.limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>();

        let page_size = query.max_item_count.unwrap_or(self.page_size).max(1);
        let next = offset + page_size;

        Ok(QueryPage {
            items: results
                .iter()
                .skip(offset)
                .take(page_size)
                .map(|item| Self::project(item, &query.projection))
                .collect(),
            continuation: (next < results.len()).then(|| next.to_string()),
        })
    }
}

/// Builder for [`InMemoryBackend`] instances.
///
/// # Example
///
/// ```ignore
/// use nosqlayer_memory::InMemoryBackend;
/// use nosqlayer_core::backend::BackendBuilder;
///
/// let backend = InMemoryBackend::builder().page_size(2).build().await?;
/// ```
#[derive(Debug, Clone)]
pub struct InMemoryBackendBuilder {
    page_size: usize,
}

impl Default for InMemoryBackendBuilder {
    fn default() -> Self {
        Self { page_size: DEFAULT_PAGE_SIZE }
    }
}

impl InMemoryBackendBuilder {
    /// Sets the number of items returned per query page.
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }
}

#[async_trait]
impl BackendBuilder for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    async fn build(self) -> DataAccessResult<Self::Backend> {
        Ok(InMemoryBackend::with_page_size(self.page_size))
    }
}

/// Connecting through the builder validates the settings like a networked client would,
/// then hands out a fresh backend.
#[async_trait]
impl ClientFactory for InMemoryBackendBuilder {
    type Backend = InMemoryBackend;

    async fn create_client(&self, config: &ConnectionConfig) -> DataAccessResult<Self::Backend> {
        config.validate()?;
        debug!(endpoint = %config.endpoint_uri, database = %config.database_name, "created in-memory client");

        Ok(InMemoryBackend::with_page_size(self.page_size))
    }
}
