//! Typed literal values used as the right-hand operand of search predicates.
//!
//! A [`QueryTerm`] is immutable once built. Reading it back as a concrete Rust type is always
//! explicit: every `as_*` accessor checks both the data type and the scalar/array shape and
//! returns [`DataAccessError::TypeMismatch`] when they do not line up. The only widening that
//! is allowed is reading a scalar integer as a double.
//!
//! ```ignore
//! use nosqlayer_core::term::QueryTerm;
//!
//! let term = QueryTerm::from(42);
//! assert_eq!(term.as_i64()?, 42);
//! assert_eq!(term.as_f64()?, 42.0);
//! assert!(term.as_str().is_err());
//! ```

use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

use crate::error::{DataAccessError, DataAccessResult};

/// Format used whenever a date is rendered as text.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// The element type held by a [`QueryTerm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Date,
    Double,
    Integer,
    Boolean,
    String,
    /// Only used by [`QueryTerm::Null`].
    Unknown,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Date => "Date",
            DataType::Double => "Double",
            DataType::Integer => "Integer",
            DataType::Boolean => "Boolean",
            DataType::String => "String",
            DataType::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// A typed scalar or one-level array literal.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryTerm {
    /// The distinguished null term.
    Null,
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    StringArray(Vec<String>),
    IntegerArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    BooleanArray(Vec<bool>),
    DateArray(Vec<DateTime<Utc>>),
}

impl QueryTerm {
    /// Returns the element type of this term.
    pub fn data_type(&self) -> DataType {
        match self {
            QueryTerm::Null => DataType::Unknown,
            QueryTerm::String(_) | QueryTerm::StringArray(_) => DataType::String,
            QueryTerm::Integer(_) | QueryTerm::IntegerArray(_) => DataType::Integer,
            QueryTerm::Double(_) | QueryTerm::DoubleArray(_) => DataType::Double,
            QueryTerm::Boolean(_) | QueryTerm::BooleanArray(_) => DataType::Boolean,
            QueryTerm::Date(_) | QueryTerm::DateArray(_) => DataType::Date,
        }
    }

    pub fn is_array(&self) -> bool {
        matches!(
            self,
            QueryTerm::StringArray(_)
                | QueryTerm::IntegerArray(_)
                | QueryTerm::DoubleArray(_)
                | QueryTerm::BooleanArray(_)
                | QueryTerm::DateArray(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, QueryTerm::Null)
    }

    /// Human readable shape of the term, e.g. `Integer` or `String[]`.
    pub fn shape(&self) -> String {
        shape_name(self.data_type(), self.is_array())
    }

    fn mismatch(&self, requested: DataType, array: bool) -> DataAccessError {
        DataAccessError::TypeMismatch {
            actual: self.shape(),
            requested: shape_name(requested, array),
        }
    }

    pub fn as_str(&self) -> DataAccessResult<&str> {
        match self {
            QueryTerm::String(value) => Ok(value),
            _ => Err(self.mismatch(DataType::String, false)),
        }
    }

    pub fn as_i64(&self) -> DataAccessResult<i64> {
        match self {
            QueryTerm::Integer(value) => Ok(*value),
            _ => Err(self.mismatch(DataType::Integer, false)),
        }
    }

    /// Reads the term as a double. Scalar integers are widened.
    pub fn as_f64(&self) -> DataAccessResult<f64> {
        match self {
            QueryTerm::Double(value) => Ok(*value),
            QueryTerm::Integer(value) => Ok(*value as f64),
            _ => Err(self.mismatch(DataType::Double, false)),
        }
    }

    pub fn as_bool(&self) -> DataAccessResult<bool> {
        match self {
            QueryTerm::Boolean(value) => Ok(*value),
            _ => Err(self.mismatch(DataType::Boolean, false)),
        }
    }

    pub fn as_date(&self) -> DataAccessResult<DateTime<Utc>> {
        match self {
            QueryTerm::Date(value) => Ok(*value),
            _ => Err(self.mismatch(DataType::Date, false)),
        }
    }

    pub fn as_str_array(&self) -> DataAccessResult<&[String]> {
        match self {
            QueryTerm::StringArray(values) => Ok(values),
            _ => Err(self.mismatch(DataType::String, true)),
        }
    }

    pub fn as_i64_array(&self) -> DataAccessResult<&[i64]> {
        match self {
            QueryTerm::IntegerArray(values) => Ok(values),
            _ => Err(self.mismatch(DataType::Integer, true)),
        }
    }

    pub fn as_f64_array(&self) -> DataAccessResult<&[f64]> {
        match self {
            QueryTerm::DoubleArray(values) => Ok(values),
            _ => Err(self.mismatch(DataType::Double, true)),
        }
    }

    pub fn as_bool_array(&self) -> DataAccessResult<&[bool]> {
        match self {
            QueryTerm::BooleanArray(values) => Ok(values),
            _ => Err(self.mismatch(DataType::Boolean, true)),
        }
    }

    pub fn as_date_array(&self) -> DataAccessResult<&[DateTime<Utc>]> {
        match self {
            QueryTerm::DateArray(values) => Ok(values),
            _ => Err(self.mismatch(DataType::Date, true)),
        }
    }

    /// Splits an array term into its scalar elements. A scalar term yields itself.
    pub fn elements(&self) -> Vec<QueryTerm> {
        match self {
            QueryTerm::StringArray(values) => values.iter().cloned().map(QueryTerm::String).collect(),
            QueryTerm::IntegerArray(values) => values.iter().copied().map(QueryTerm::Integer).collect(),
            QueryTerm::DoubleArray(values) => values.iter().copied().map(QueryTerm::Double).collect(),
            QueryTerm::BooleanArray(values) => values.iter().copied().map(QueryTerm::Boolean).collect(),
            QueryTerm::DateArray(values) => values.iter().copied().map(QueryTerm::Date).collect(),
            scalar => vec![scalar.clone()],
        }
    }
}

fn shape_name(data_type: DataType, array: bool) -> String {
    if array {
        format!("{data_type}[]")
    } else {
        data_type.to_string()
    }
}

impl fmt::Display for QueryTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryTerm::Null => f.write_str("null"),
            QueryTerm::String(value) => f.write_str(value),
            QueryTerm::Integer(value) => write!(f, "{value}"),
            QueryTerm::Double(value) => write!(f, "{value}"),
            QueryTerm::Boolean(value) => write!(f, "{value}"),
            QueryTerm::Date(value) => write!(f, "{}", value.format(DATETIME_FORMAT)),
            QueryTerm::StringArray(values) => write_list(f, values.iter().map(|v| format!("\"{v}\""))),
            QueryTerm::IntegerArray(values) => write_list(f, values.iter().map(ToString::to_string)),
            QueryTerm::DoubleArray(values) => write_list(f, values.iter().map(ToString::to_string)),
            QueryTerm::BooleanArray(values) => write_list(f, values.iter().map(ToString::to_string)),
            QueryTerm::DateArray(values) => write_list(
                f,
                values.iter().map(|v| v.format(DATETIME_FORMAT).to_string()),
            ),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, items: impl Iterator<Item = String>) -> fmt::Result {
    write!(f, "[{}]", items.collect::<Vec<_>>().join(", "))
}

impl From<&str> for QueryTerm {
    fn from(value: &str) -> Self {
        QueryTerm::String(value.to_string())
    }
}

impl From<String> for QueryTerm {
    fn from(value: String) -> Self {
        QueryTerm::String(value)
    }
}

impl From<i64> for QueryTerm {
    fn from(value: i64) -> Self {
        QueryTerm::Integer(value)
    }
}

impl From<i32> for QueryTerm {
    fn from(value: i32) -> Self {
        QueryTerm::Integer(value.into())
    }
}

impl From<f64> for QueryTerm {
    fn from(value: f64) -> Self {
        QueryTerm::Double(value)
    }
}

impl From<bool> for QueryTerm {
    fn from(value: bool) -> Self {
        QueryTerm::Boolean(value)
    }
}

impl<Tz: TimeZone> From<DateTime<Tz>> for QueryTerm {
    fn from(value: DateTime<Tz>) -> Self {
        QueryTerm::Date(value.with_timezone(&Utc))
    }
}

impl From<Vec<String>> for QueryTerm {
    fn from(values: Vec<String>) -> Self {
        QueryTerm::StringArray(values)
    }
}

impl From<Vec<&str>> for QueryTerm {
    fn from(values: Vec<&str>) -> Self {
        QueryTerm::StringArray(values.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<i64>> for QueryTerm {
    fn from(values: Vec<i64>) -> Self {
        QueryTerm::IntegerArray(values)
    }
}

impl From<Vec<f64>> for QueryTerm {
    fn from(values: Vec<f64>) -> Self {
        QueryTerm::DoubleArray(values)
    }
}

impl From<Vec<bool>> for QueryTerm {
    fn from(values: Vec<bool>) -> Self {
        QueryTerm::BooleanArray(values)
    }
}

impl From<Vec<DateTime<Utc>>> for QueryTerm {
    fn from(values: Vec<DateTime<Utc>>) -> Self {
        QueryTerm::DateArray(values)
    }
}
