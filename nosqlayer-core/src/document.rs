//! Items and typed documents.
//!
//! The canonical item shape exchanged with every backend is a JSON object ([`Item`]).
//! Upstream code that prefers typed records implements [`Document`] and converts through
//! [`DocumentExt`].
//!
//! ```ignore
//! use nosqlayer_core::document::Document;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! pub struct Timer {
//!     pub id: String,
//!     pub user_id: String,
//! }
//!
//! impl Document for Timer {
//!     fn container_name() -> &'static str {
//!         "timers"
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, from_value, to_value};

use crate::{
    constants::ID,
    error::{DataAccessError, DataAccessResult},
};

/// A JSON object as stored in, and returned from, a container.
pub type Item = Map<String, Value>;

/// A typed record stored in a single container.
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Name of the container this document type lives in.
    fn container_name() -> &'static str;
}

/// Conversion between typed documents and items. Implemented for every [`Document`].
pub trait DocumentExt: Document {
    /// Serializes the document into an item.
    ///
    /// # Errors
    ///
    /// Fails if the document does not serialize to a JSON object.
    fn to_item(&self) -> DataAccessResult<Item>;

    /// Deserializes a document from an item.
    fn from_item(item: Item) -> DataAccessResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_item(&self) -> DataAccessResult<Item> {
        match to_value(self)? {
            Value::Object(item) => Ok(item),
            other => Err(DataAccessError::Serialization(format!(
                "expected a JSON object for container {}, got {other}",
                D::container_name()
            ))),
        }
    }

    fn from_item(item: Item) -> DataAccessResult<Self> {
        Ok(from_value(Value::Object(item))?)
    }
}

/// Returns the item's `id` when it is a string.
pub fn item_id(item: &Item) -> Option<&str> {
    item.get(ID).and_then(Value::as_str)
}

/// Resolves a `/`-separated key path (`/userId`, `/address/zip`) against an item.
pub fn value_at_path<'a>(item: &'a Item, path: &str) -> Option<&'a Value> {
    let mut segments = path.trim_start_matches('/').split('/');
    let first = segments.next()?;
    segments.try_fold(item.get(first)?, |value, segment| value.get(segment))
}

/// Renders a scalar JSON value the way it is used as a partition key.
pub fn partition_key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(value) => Some(value.clone()),
        Value::Number(value) => Some(value.to_string()),
        Value::Bool(value) => Some(value.to_string()),
        _ => None,
    }
}
