//! The generic data-access contract consumed by upstream services.
//!
//! Every operation takes a container name plus identifiers or a partition scope and returns
//! canonical [`Item`]s or a count. Implementations differ per backend; the per-operation
//! failure policies below are part of the contract:
//!
//! | operation | on a failed item |
//! |-----------|------------------|
//! | `create`, `soft_delete_by_ids`, `undelete_by_ids` | the whole call fails |
//! | `delete_by_ids` | the item is logged and left out of the result |
//! | `delete_by_key_value` | the whole call fails; earlier batches stay deleted |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::Debug;

use crate::{
    clone::{CloneInput, CloneTableStatus},
    document::Item,
    error::{DataAccessError, DataAccessResult},
    expression::SearchExpression,
    options::{FindOptions, ReturnValueOption, UpdateResult},
};

/// How long a soft-deleted item is kept before the backend purges it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SoftDeleteTtl {
    pub purge_deleted_after_days: i64,
}

impl SoftDeleteTtl {
    pub fn days(purge_deleted_after_days: i64) -> Self {
        Self { purge_deleted_after_days }
    }

    /// The purge delay in seconds, as written to the `ttl` attribute.
    pub fn as_seconds(&self) -> i64 {
        self.purge_deleted_after_days.saturating_mul(86_400)
    }
}

#[async_trait]
pub trait NoSqlDbService: Send + Sync + Debug {
    /// Creates 1 to 25 items and returns them as stored, in input order.
    async fn create(&self, container: &str, items: Vec<Item>) -> DataAccessResult<Vec<Item>>;

    /// Reads 1 to 100 distinct ids from one partition.
    async fn find_by_ids(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
    ) -> DataAccessResult<Vec<Item>>;

    /// Runs a filtered, paged search inside one partition.
    async fn find_by_search_criteria(
        &self,
        container: &str,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
        options: Option<&FindOptions>,
    ) -> DataAccessResult<Vec<Item>>;

    /// Counts the items matching a filter inside one partition.
    async fn count_by_search_criteria(
        &self,
        container: &str,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
    ) -> DataAccessResult<u64>;

    /// Deletes 1 to 25 ids and returns the items that were deleted.
    async fn delete_by_ids(
        &self,
        container: &str,
        partition_value: &str,
        ids: &[String],
    ) -> DataAccessResult<Vec<Item>>;

    /// Deletes every item whose `key_attribute` equals `value` across the given containers.
    async fn delete_by_key_value(
        &self,
        containers: &[String],
        key_attribute: &str,
        value: &Value,
        batch_size: usize,
    ) -> DataAccessResult<()>;

    /// Marks items as deleted, optionally scheduling their purge.
    async fn soft_delete_by_ids(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<()>;

    /// Clears the deleted mark, dropping any scheduled purge when `ttl` is given.
    async fn undelete_by_ids(
        &self,
        container: &str,
        ids: &[String],
        partition_value: &str,
        ttl: Option<&SoftDeleteTtl>,
    ) -> DataAccessResult<Vec<Item>>;

    /// Applies `updates` to one item and reports the states requested by `return_value`.
    async fn update_by_id(
        &self,
        container: &str,
        id: &str,
        partition_value: &str,
        updates: Item,
        return_value: ReturnValueOption,
    ) -> DataAccessResult<UpdateResult>;

    /// Clones items from one key value to another. Optional; the default reports it as
    /// unsupported.
    async fn clone_by_key_value(
        &self,
        input: Option<CloneInput>,
        key_attribute: &str,
        source_value: &Value,
        target_value: &Value,
    ) -> DataAccessResult<Vec<CloneTableStatus>> {
        let _ = (input, key_attribute, source_value, target_value);
        Err(DataAccessError::NotSupported(
            "clone by key value is not implemented by this backend".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_convert_purge_days_to_seconds() {
        assert_eq!(SoftDeleteTtl::days(2).as_seconds(), 172_800);
        assert_eq!(SoftDeleteTtl::days(0).as_seconds(), 0);
    }
}
