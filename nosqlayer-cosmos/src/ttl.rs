//! Time-to-live derivation for created items.
//!
//! The expiry is read from the container's configured TTL attribute and written to `ttl` as
//! UTC epoch seconds. Two input shapes are accepted: an absolute .NET tick count (100ns
//! intervals since 0001-01-01) or a date-time string.

use serde_json::Value;

use nosqlayer_core::{
    document::Item,
    error::{DataAccessError, DataAccessResult},
    parser,
    term::QueryTerm,
};

/// Tick count of 1970-01-01T00:00:00Z.
const UNIX_EPOCH_TICKS: i64 = 621_355_968_000_000_000;
const TICKS_PER_SECOND: i64 = 10_000_000;
/// Tick count of 9999-12-31T23:59:59.9999999, the last representable instant.
const MAX_TICKS: i64 = 3_155_378_975_999_999_999;

fn ticks_to_epoch_seconds(ticks: i64) -> Option<i64> {
    if !(0..=MAX_TICKS).contains(&ticks) {
        return None;
    }

    ticks
        .checked_sub(UNIX_EPOCH_TICKS)
        .map(|offset| offset.div_euclid(TICKS_PER_SECOND))
}

/// Reads `attribute` from `item` and converts it to epoch seconds. An absent or null attribute
/// yields `None`.
pub(crate) fn derive(item: &Item, attribute: &str) -> DataAccessResult<Option<i64>> {
    let invalid = |value: &Value| {
        DataAccessError::Validation(format!(
            "Time to live attribute '{attribute}' must hold a tick count or a date, got {value}."
        ))
    };

    match item.get(attribute) {
        None | Some(Value::Null) => Ok(None),
        Some(value @ Value::Number(number)) => number
            .as_i64()
            .and_then(ticks_to_epoch_seconds)
            .map(Some)
            .ok_or_else(|| invalid(value)),
        Some(value @ Value::String(_)) => match parser::parse_literal(value)? {
            QueryTerm::Date(date) => Ok(Some(date.timestamp())),
            _ => Err(invalid(value)),
        },
        Some(value) => Err(invalid(value)),
    }
}
