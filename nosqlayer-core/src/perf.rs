//! Per-operation performance records.
//!
//! Services start a [`PerformanceLog`] when an operation begins and finish it with the number
//! of objects the operation touched. The record is emitted as a structured `tracing` event at
//! debug level under the `nosqlayer::perf` target; installing a subscriber is left to the
//! application.

use std::{fmt, time::Instant};
use tracing::debug;

/// Kind of data-access operation, used in performance records and validation messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Query,
    Insert,
    Update,
    Delete,
    Clone,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Query => "Query",
            Operation::Insert => "Insert",
            Operation::Update => "Update",
            Operation::Delete => "Delete",
            Operation::Clone => "Clone",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct PerformanceLog {
    operation: Operation,
    container: String,
    started: Instant,
}

impl PerformanceLog {
    pub fn start(operation: Operation, container: impl Into<String>) -> Self {
        Self {
            operation,
            container: container.into(),
            started: Instant::now(),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Emits the record and returns the elapsed time in milliseconds.
    pub fn finish(self, number_of_objects: usize) -> u64 {
        let duration_ms = self.started.elapsed().as_millis() as u64;

        debug!(
            target: "nosqlayer::perf",
            message_type = "Performance Metric",
            operation = %self.operation,
            container = %self.container,
            duration_ms,
            number_of_objects,
            "data access operation completed"
        );

        duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_display_operation_names() {
        assert_eq!(Operation::Insert.to_string(), "Insert");
        assert_eq!(Operation::Clone.to_string(), "Clone");
    }

    #[test]
    fn test_should_measure_elapsed_time() {
        let log = PerformanceLog::start(Operation::Query, "timers");
        assert_eq!(log.operation(), Operation::Query);
        assert!(log.finish(3) < 60_000);
    }
}
