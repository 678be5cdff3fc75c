//! Container schemas and the registry they are looked up from.
//!
//! A [`ContainerConfiguration`] describes one container: its partition key path, the attributes
//! whose stored name differs from their external name, and the optional time-to-live setup.
//! Configurations are read-only at runtime and are handed to services through a
//! [`SchemaRegistry`].
//!
//! ```ignore
//! use nosqlayer_core::schema::StaticSchemaRegistry;
//!
//! let registry = StaticSchemaRegistry::from_json_str(r#"[
//!     {
//!         "containerName": "timers",
//!         "aliasProcessingEnabled": true,
//!         "schema": {
//!             "keyConfiguration": { "partitionKeyPath": "/userId" },
//!             "attributes": [{ "name": "timerId", "dbName": "id", "type": "String" }]
//!         },
//!         "timeToLive": { "attributeName": "expiresAt" }
//!     }
//! ]"#)?;
//! ```

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt::Debug};

use crate::{
    document::Item,
    error::{DataAccessError, DataAccessResult},
    perf::Operation,
};

/// Declared type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AttributeType {
    #[default]
    String,
    Number,
    Long,
    DateTime,
    Boolean,
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfiguration {
    /// Partition key path, e.g. `/userId` or `/address/zip`.
    pub partition_key_path: String,
    #[serde(default)]
    pub sort_key_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerAttribute {
    /// External attribute name.
    pub name: String,
    /// Stored attribute name, when it differs from `name`.
    #[serde(default)]
    pub db_name: Option<String>,
    #[serde(default, rename = "type")]
    pub attribute_type: AttributeType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSchema {
    pub key_configuration: KeyConfiguration,
    #[serde(default)]
    pub attributes: Vec<ContainerAttribute>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeToLiveConfig {
    /// Input attribute the item expiry is read from.
    pub attribute_name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Container-level default TTL, applied by the backend itself.
    #[serde(default)]
    pub ttl_in_seconds: Option<i64>,
}

/// Everything the data-access layer needs to know about one container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerConfiguration {
    pub container_name: String,
    pub schema: ContainerSchema,
    /// Enables renaming between external and stored attribute names.
    #[serde(default)]
    pub alias_processing_enabled: bool,
    #[serde(default)]
    pub time_to_live: Option<TimeToLiveConfig>,
}

impl ContainerConfiguration {
    pub fn new(container_name: impl Into<String>, partition_key_path: impl Into<String>) -> Self {
        Self {
            container_name: container_name.into(),
            schema: ContainerSchema {
                key_configuration: KeyConfiguration {
                    partition_key_path: partition_key_path.into(),
                    sort_key_path: None,
                },
                attributes: Vec::new(),
            },
            alias_processing_enabled: false,
            time_to_live: None,
        }
    }

    /// Adds an attribute stored under `db_name` and turns alias processing on.
    pub fn with_alias(mut self, name: impl Into<String>, db_name: impl Into<String>) -> Self {
        self.schema.attributes.push(ContainerAttribute {
            name: name.into(),
            db_name: Some(db_name.into()),
            attribute_type: AttributeType::String,
        });
        self.alias_processing_enabled = true;
        self
    }

    pub fn with_time_to_live(mut self, attribute_name: impl Into<String>) -> Self {
        self.time_to_live = Some(TimeToLiveConfig {
            attribute_name: attribute_name.into(),
            enabled: true,
            ttl_in_seconds: None,
        });
        self
    }

    pub fn partition_key_path(&self) -> &str {
        &self.schema.key_configuration.partition_key_path
    }

    /// Partition key as a dotted attribute path: `/address/zip` becomes `address.zip`.
    pub fn partition_key_name(&self) -> String {
        self.partition_key_path()
            .trim_start_matches('/')
            .replace('/', ".")
    }

    /// The input attribute TTLs are derived from, when TTL is enabled.
    pub fn ttl_attribute(&self) -> Option<&str> {
        self.time_to_live
            .as_ref()
            .filter(|ttl| ttl.enabled)
            .map(|ttl| ttl.attribute_name.as_str())
    }

    /// Alias table for this container. Empty unless alias processing is enabled.
    pub fn field_aliases(&self) -> FieldAliases {
        if !self.alias_processing_enabled {
            return FieldAliases::default();
        }

        FieldAliases::new(
            self.schema
                .attributes
                .iter()
                .filter_map(|attr| attr.db_name.as_ref().map(|db| (attr.name.clone(), db.clone()))),
        )
    }
}

/// Bidirectional mapping between external and stored attribute names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldAliases {
    to_stored: HashMap<String, String>,
    to_external: HashMap<String, String>,
}

impl FieldAliases {
    /// Builds the table from `(external, stored)` pairs.
    pub fn new(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let to_stored = pairs.into_iter().collect::<HashMap<_, _>>();
        let to_external = to_stored
            .iter()
            .map(|(external, stored)| (stored.clone(), external.clone()))
            .collect();

        Self { to_stored, to_external }
    }

    pub fn is_empty(&self) -> bool {
        self.to_stored.is_empty()
    }

    /// Stored name for an external attribute; unaliased names map to themselves.
    pub fn stored_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_stored.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn external_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.to_external.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Returns a copy of `item` with external names replaced by stored names. When both an
    /// alias and its stored name are present the aliased value wins.
    pub fn to_stored(&self, item: &Item) -> Item {
        Self::rename(item, &self.to_stored)
    }

    /// Returns a copy of `item` with stored names replaced by external names.
    pub fn to_external(&self, item: &Item) -> Item {
        Self::rename(item, &self.to_external)
    }

    fn rename(item: &Item, table: &HashMap<String, String>) -> Item {
        if table.is_empty() {
            return item.clone();
        }

        let (renamed, kept): (Vec<_>, Vec<_>) = item
            .iter()
            .partition(|(key, _)| table.contains_key(key.as_str()));

        kept.into_iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .chain(
                renamed
                    .into_iter()
                    .map(|(key, value)| (table[key.as_str()].clone(), value.clone())),
            )
            .collect()
    }
}

/// Source of container configurations, injected into services at construction.
pub trait SchemaRegistry: Send + Sync + Debug {
    fn container(&self, name: &str) -> Option<&ContainerConfiguration>;

    /// Looks up a container, failing with a configuration error when it is not registered.
    fn resolve(&self, name: &str, operation: Operation) -> DataAccessResult<&ContainerConfiguration> {
        self.container(name).ok_or_else(|| {
            DataAccessError::Configuration(format!(
                "Invalid container name '{name}' for {operation} operation."
            ))
        })
    }
}

/// A registry built once from a fixed set of configurations.
#[derive(Debug, Clone, Default)]
pub struct StaticSchemaRegistry {
    containers: HashMap<String, ContainerConfiguration>,
}

impl StaticSchemaRegistry {
    pub fn new(configurations: impl IntoIterator<Item = ContainerConfiguration>) -> Self {
        Self {
            containers: configurations
                .into_iter()
                .map(|config| (config.container_name.clone(), config))
                .collect(),
        }
    }

    /// Parses a JSON array of container configurations.
    pub fn from_json_str(json: &str) -> DataAccessResult<Self> {
        let configurations: Vec<ContainerConfiguration> = serde_json::from_str(json)?;
        Ok(Self::new(configurations))
    }

    pub fn insert(&mut self, configuration: ContainerConfiguration) {
        self.containers
            .insert(configuration.container_name.clone(), configuration);
    }

    pub fn container_names(&self) -> impl Iterator<Item = &str> {
        self.containers.keys().map(String::as_str)
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn container(&self, name: &str) -> Option<&ContainerConfiguration> {
        self.containers.get(name)
    }
}
