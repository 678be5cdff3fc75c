//! Input checks run before any backend call.

use std::collections::HashSet;

use nosqlayer_core::{
    error::{DataAccessError, DataAccessResult},
    perf::Operation,
};

/// Rejects empty input and input larger than `max`.
pub(crate) fn ensure_batch<T>(input: &[T], max: usize, operation: Operation) -> DataAccessResult<()> {
    if input.is_empty() {
        return Err(DataAccessError::Validation(format!(
            "Input for '{operation}' operation cannot be null or empty."
        )));
    }

    if input.len() > max {
        return Err(DataAccessError::Validation(format!(
            "Input for '{operation}' operation cannot exceed the maximum allowed size of {max}."
        )));
    }

    Ok(())
}

pub(crate) fn ensure_not_empty<T>(input: &[T], operation: Operation) -> DataAccessResult<()> {
    ensure_batch(input, usize::MAX, operation)
}

pub(crate) fn ensure_unique(ids: &[String], operation: Operation, container: &str) -> DataAccessResult<()> {
    let mut seen = HashSet::with_capacity(ids.len());

    if ids.iter().all(|id| seen.insert(id.as_str())) {
        Ok(())
    } else {
        Err(DataAccessError::DuplicateKey(format!(
            "The input for '{operation}' operation cannot have duplicate values against '{container}'."
        )))
    }
}

pub(crate) fn ensure_partition_value(partition_value: &str) -> DataAccessResult<()> {
    if partition_value.trim().is_empty() {
        return Err(DataAccessError::Validation(
            "Partition key value cannot be null or empty.".into(),
        ));
    }

    Ok(())
}
