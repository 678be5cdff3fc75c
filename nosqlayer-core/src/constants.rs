//! Limits and reserved attribute names shared by every backend.

/// Default page size when a find request carries no limit.
pub const QUERY_LIMIT_DEFAULT: usize = 100;
/// Hard maximum page size for a find request.
pub const QUERY_LIMIT_MAX: usize = 500;
/// Default number of results skipped.
pub const QUERY_SKIP_DEFAULT: usize = 0;

/// Maximum number of ids accepted by a batch read.
pub const BATCH_GET_MAX: usize = 100;
/// Maximum number of items accepted by a batch create or delete.
pub const BATCH_WRITE_MAX: usize = 25;
/// Default sub-batch size for deletes by key value.
pub const BULK_DELETE_BATCH_SIZE: usize = 500;
/// Default batch size for clone requests.
pub const CLONE_BATCH_SIZE: usize = 500;

/// Soft-delete marker attribute.
pub const IS_DELETED: &str = "isDeleted";
/// Attribute carrying the backend time-to-live, in seconds.
pub const TTL: &str = "ttl";
/// Attribute carrying the item identifier.
pub const ID: &str = "id";

/// Fields stamped by the backend that never leave the data-access layer.
pub const SYSTEM_FIELDS: [&str; 5] = ["_rid", "_self", "_etag", "_attachments", "_ts"];
