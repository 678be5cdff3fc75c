//! Request options: pagination, sorting, projection and update return values.
//!
//! # Find options
//!
//! ```ignore
//! use nosqlayer_core::options::{FindOptions, SortDirection};
//!
//! let options = FindOptions::builder()
//!     .sort("createdAt", SortDirection::Descending)
//!     .projection(["id", "name"])
//!     .limit(10)
//!     .skip(20)
//!     .build();
//! ```
//!
//! # Return values
//!
//! [`ReturnValueOption`] expresses which states of an updated item the caller wants back.
//! Options the backend cannot express natively are mapped through a fixed table
//! ([`ReturnValueOption::native`]); [`ReturnValueOption::resolve`] still reports the result
//! using the originally requested semantics.

use serde::{Deserialize, Serialize};

use crate::{
    constants::{QUERY_LIMIT_DEFAULT, QUERY_SKIP_DEFAULT},
    document::Item,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Field to order find results by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortField {
    pub field_name: String,
    pub sort_direction: SortDirection,
}

fn default_projection() -> Vec<String> {
    vec!["*".to_string()]
}

/// Pagination, sorting and projection for a find request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindOptions {
    #[serde(default)]
    pub sort_field: Option<SortField>,
    #[serde(default = "default_projection")]
    pub projection_fields: Vec<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub skip: Option<usize>,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            sort_field: None,
            projection_fields: default_projection(),
            limit: None,
            skip: None,
        }
    }
}

impl FindOptions {
    pub fn builder() -> FindOptionsBuilder {
        FindOptionsBuilder::default()
    }

    /// The effective limit, falling back to the default page size.
    pub fn limit_or_default(&self) -> usize {
        self.limit.unwrap_or(QUERY_LIMIT_DEFAULT)
    }

    pub fn skip_or_default(&self) -> usize {
        self.skip.unwrap_or(QUERY_SKIP_DEFAULT)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FindOptionsBuilder {
    options: FindOptions,
}

impl FindOptionsBuilder {
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options.sort_field = Some(SortField {
            field_name: field.into(),
            sort_direction: direction,
        });
        self
    }

    /// Replaces the projection. An empty projection selects every field.
    pub fn projection<S: Into<String>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.options.projection_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.options.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.options.skip = Some(skip);
        self
    }

    pub fn build(self) -> FindOptions {
        self.options
    }
}

/// Which item states an update reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReturnValueOption {
    AllNew,
    AllOld,
    AllOldNew,
    UpdatedNew,
    UpdatedOld,
    UpdatedOldNew,
    #[default]
    None,
}

/// Options without a native backend equivalent, and the option sent in their place.
pub const NATIVE_RETURN_VALUE_MAP: [(ReturnValueOption, ReturnValueOption); 2] = [
    (ReturnValueOption::AllOldNew, ReturnValueOption::AllOld),
    (ReturnValueOption::UpdatedOldNew, ReturnValueOption::UpdatedOld),
];

impl ReturnValueOption {
    /// The option a backend is asked for.
    pub fn native(self) -> ReturnValueOption {
        NATIVE_RETURN_VALUE_MAP
            .iter()
            .find(|(requested, _)| *requested == self)
            .map(|(_, native)| *native)
            .unwrap_or(self)
    }

    pub fn includes_old(self) -> bool {
        matches!(
            self,
            ReturnValueOption::AllOld
                | ReturnValueOption::AllOldNew
                | ReturnValueOption::UpdatedOld
                | ReturnValueOption::UpdatedOldNew
        )
    }

    pub fn includes_new(self) -> bool {
        matches!(
            self,
            ReturnValueOption::AllNew
                | ReturnValueOption::AllOldNew
                | ReturnValueOption::UpdatedNew
                | ReturnValueOption::UpdatedOldNew
        )
    }

    /// Projects the pre- and post-update states onto what was requested.
    pub fn resolve(self, old: Item, new: Item) -> UpdateResult {
        UpdateResult {
            old: self.includes_old().then_some(old),
            new: self.includes_new().then_some(new),
        }
    }
}

/// States of an item returned by an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    pub old: Option<Item>,
    pub new: Option<Item>,
}
