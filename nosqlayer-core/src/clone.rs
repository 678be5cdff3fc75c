//! Request and status types for cloning items between partition values.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::{constants::CLONE_BATCH_SIZE, expression::SearchExpression};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CloneStatus {
    Processing,
    Progressing,
    Completed,
    Failed,
}

/// Progress of a clone for one container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneTableStatus {
    pub table_name: String,
    #[serde(default)]
    pub status: Option<CloneStatus>,
    #[serde(default)]
    pub queried_item_count: u64,
    #[serde(default)]
    pub cloned_item_count: u64,
    /// Key attributes of the last item read, used to resume a partial clone.
    #[serde(default)]
    pub last_evaluated_attributes: HashMap<String, Value>,
}

impl CloneTableStatus {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            status: None,
            queried_item_count: 0,
            cloned_item_count: 0,
            last_evaluated_attributes: HashMap::new(),
        }
    }
}

fn default_batch_size() -> usize {
    CLONE_BATCH_SIZE
}

/// Containers to clone and the limits of one clone pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloneInput {
    pub table_statuses: Vec<CloneTableStatus>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Items matching this criteria are not cloned.
    #[serde(skip)]
    pub cut_off_criteria: Option<SearchExpression>,
}

impl CloneInput {
    pub fn new(tables: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            table_statuses: tables
                .into_iter()
                .map(|table| CloneTableStatus::new(table))
                .collect(),
            batch_size: CLONE_BATCH_SIZE,
            cut_off_criteria: None,
        }
    }
}
