//! Conversion of stored items back to the shape callers see.
//!
//! Stored items carry backend bookkeeping fields and stored attribute names. Before an item
//! leaves the service the bookkeeping fields are dropped and aliased attributes get their
//! external names back.

use nosqlayer_core::{constants::SYSTEM_FIELDS, document::Item, schema::FieldAliases};

/// Removes the fields the backend stamps on every write.
pub(crate) fn strip_system_fields(mut item: Item) -> Item {
    for field in SYSTEM_FIELDS {
        item.remove(field);
    }
    item
}

/// Stored item to external item.
pub(crate) fn to_external(item: Item, aliases: &FieldAliases) -> Item {
    aliases.to_external(&strip_system_fields(item))
}
