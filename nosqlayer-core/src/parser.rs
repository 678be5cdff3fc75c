//! Parsing of JSON search criteria into [`SearchExpression`] trees.
//!
//! Every node carries an `op` naming a [`QueryOperator`]. `And`/`Or` nodes carry a
//! `searchTerms` array; relational and membership nodes carry a string `left` and a literal
//! `right`:
//!
//! ```json
//! { "op": "And", "searchTerms": [
//!     { "op": "Eq", "left": "status", "right": "active" },
//!     { "op": "In", "left": "priority", "right": [1, 2] }
//! ] }
//! ```
//!
//! `Not` and `Contains` have no translation and parse to no expression. Inside a logical
//! node such children are skipped.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::{
    error::{DataAccessError, DataAccessResult},
    expression::{BinaryExpression, LogicalExpression, LogicalOperator, QueryOperator, SearchExpression},
    term::{DataType, QueryTerm},
};

const NAIVE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parses search criteria text. Blank text yields no expression.
pub fn parse_str(input: &str) -> DataAccessResult<Option<SearchExpression>> {
    if input.trim().is_empty() {
        return Ok(None);
    }

    parse(&serde_json::from_str::<Value>(input)?)
}

/// Parses a search criteria tree. `null` and `{}` yield no expression.
pub fn parse(input: &Value) -> DataAccessResult<Option<SearchExpression>> {
    let node = match input {
        Value::Null => return Ok(None),
        Value::Object(node) if node.is_empty() => return Ok(None),
        Value::Object(node) => node,
        other => {
            return Err(DataAccessError::Parse(format!(
                "search criteria must be a JSON object, got {other}"
            )));
        }
    };

    let op = match node.get("op") {
        Some(Value::String(op)) => op.parse::<QueryOperator>()?,
        Some(other) => {
            return Err(DataAccessError::Parse(format!("'op' must be a string, got {other}")));
        }
        None => return Err(DataAccessError::Parse("search criteria node is missing 'op'".into())),
    };

    match op {
        QueryOperator::And => parse_logical(LogicalOperator::And, node).map(Some),
        QueryOperator::Or => parse_logical(LogicalOperator::Or, node).map(Some),
        QueryOperator::Eq
        | QueryOperator::Ne
        | QueryOperator::Lt
        | QueryOperator::Lte
        | QueryOperator::Gt
        | QueryOperator::Gte
        | QueryOperator::In
        | QueryOperator::Between => parse_binary(op, node).map(Some),
        QueryOperator::Not | QueryOperator::Contains => Ok(None),
    }
}

fn parse_logical(op: LogicalOperator, node: &Map<String, Value>) -> DataAccessResult<SearchExpression> {
    let Some(Value::Array(children)) = node.get("searchTerms") else {
        return Err(DataAccessError::Validation("Invalid Search Criteria!".into()));
    };

    if children.is_empty() {
        return Err(DataAccessError::Validation(
            "'searchTerms' of a logical search expression cannot be empty".into(),
        ));
    }

    let terms = children
        .iter()
        .map(parse)
        .filter_map(Result::transpose)
        .collect::<DataAccessResult<Vec<_>>>()?;

    Ok(SearchExpression::Logical(LogicalExpression::new(op, terms)))
}

fn parse_binary(op: QueryOperator, node: &Map<String, Value>) -> DataAccessResult<SearchExpression> {
    let left = match node.get("left") {
        Some(Value::String(left)) if !left.is_empty() => left.clone(),
        _ => {
            return Err(DataAccessError::Validation(format!(
                "'{op}' expression requires a non-empty string 'left' operand"
            )));
        }
    };

    let right = node.get("right").map(parse_literal).transpose()?;

    Ok(SearchExpression::Binary(BinaryExpression::new(op, left, right)))
}

/// Infers a [`QueryTerm`] from the shape of a JSON literal.
pub fn parse_literal(value: &Value) -> DataAccessResult<QueryTerm> {
    match value {
        Value::Array(elements) => parse_array(elements),
        Value::Object(_) => Err(DataAccessError::Validation(
            "object literals are not supported in search criteria".into(),
        )),
        scalar => parse_scalar(scalar),
    }
}

fn parse_scalar(value: &Value) -> DataAccessResult<QueryTerm> {
    Ok(match value {
        Value::Null => QueryTerm::Null,
        Value::Bool(value) => QueryTerm::Boolean(*value),
        Value::Number(number) => match number.as_i64() {
            Some(integer) => QueryTerm::Integer(integer),
            None => QueryTerm::Double(number.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(text) => match parse_date(text) {
            Some(date) => QueryTerm::Date(date),
            None => QueryTerm::String(text.clone()),
        },
        Value::Array(_) | Value::Object(_) => {
            return Err(DataAccessError::Validation(format!(
                "nested literal {value} is not supported in search criteria"
            )));
        }
    })
}

fn parse_array(elements: &[Value]) -> DataAccessResult<QueryTerm> {
    let Some(first) = elements.first() else {
        return Ok(QueryTerm::Null);
    };

    let element_type = parse_scalar(first)?.data_type();
    if element_type == DataType::Unknown {
        return Ok(QueryTerm::Null);
    }

    let terms = elements
        .iter()
        .map(|element| {
            let term = parse_scalar(element)?;
            match (element_type, term) {
                (DataType::Double, QueryTerm::Integer(value)) => Ok(QueryTerm::Double(value as f64)),
                (DataType::String, QueryTerm::Date(_)) => Ok(QueryTerm::String(
                    element.as_str().unwrap_or_default().to_string(),
                )),
                (expected, term) if term.data_type() == expected => Ok(term),
                (expected, term) => Err(DataAccessError::Validation(format!(
                    "array literal mixes {expected} and {} elements",
                    term.data_type()
                ))),
            }
        })
        .collect::<DataAccessResult<Vec<_>>>()?;

    Ok(match element_type {
        DataType::Unknown => QueryTerm::Null,
        DataType::String => QueryTerm::StringArray(collect(terms, |t| t.as_str().map(str::to_string))?),
        DataType::Integer => QueryTerm::IntegerArray(collect(terms, QueryTerm::as_i64)?),
        DataType::Double => QueryTerm::DoubleArray(collect(terms, QueryTerm::as_f64)?),
        DataType::Boolean => QueryTerm::BooleanArray(collect(terms, QueryTerm::as_bool)?),
        DataType::Date => QueryTerm::DateArray(collect(terms, QueryTerm::as_date)?),
    })
}

fn collect<T>(
    terms: Vec<QueryTerm>,
    read: impl Fn(&QueryTerm) -> DataAccessResult<T>,
) -> DataAccessResult<Vec<T>> {
    terms.iter().map(read).collect()
}

/// ISO-8601 date-times become UTC dates; values without an offset are taken as UTC.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, NAIVE_DATETIME_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn parse_binary_node(value: Value) -> BinaryExpression {
        match parse(&value) {
            Ok(Some(SearchExpression::Binary(binary))) => binary,
            other => panic!("expected binary expression, got {other:?}"),
        }
    }

    #[test]
    fn test_should_return_none_for_empty_input() {
        assert!(parse(&Value::Null).unwrap().is_none());
        assert!(parse(&json!({})).unwrap().is_none());
        assert!(parse_str("   ").unwrap().is_none());
    }

    #[test]
    fn test_should_parse_every_relational_operator() {
        for op in ["Eq", "Ne", "Lt", "Lte", "Gt", "Gte", "In", "Between"] {
            let binary = parse_binary_node(json!({ "op": op, "left": "age", "right": 3 }));
            assert_eq!(binary.op().as_str(), op);
            assert_eq!(binary.left(), "age");
            assert_eq!(binary.right(), Some(&QueryTerm::Integer(3)));
        }
    }

    #[test]
    fn test_should_parse_logical_tree() {
        let expr = parse(&json!({
            "op": "Or",
            "searchTerms": [
                { "op": "Eq", "left": "name", "right": "Foo" },
                { "op": "And", "searchTerms": [{ "op": "Gt", "left": "score", "right": 1.5 }] }
            ]
        }))
        .unwrap()
        .unwrap();

        let SearchExpression::Logical(root) = expr else {
            panic!("expected logical root");
        };
        assert_eq!(root.op(), LogicalOperator::Or);
        assert_eq!(root.terms().len(), 2);
        assert!(matches!(&root.terms()[1], SearchExpression::Logical(inner) if inner.op() == LogicalOperator::And));
    }

    #[test]
    fn test_should_reject_logical_without_search_terms() {
        let result = parse(&json!({ "op": "And", "searchTerms": "nope" }));
        match result {
            Err(DataAccessError::Validation(message)) => assert_eq!(message, "Invalid Search Criteria!"),
            other => panic!("expected Validation, got {other:?}"),
        }
        assert!(matches!(
            parse(&json!({ "op": "Or" })),
            Err(DataAccessError::Validation(_))
        ));
    }

    #[test]
    fn test_should_reject_empty_search_terms() {
        assert!(matches!(
            parse(&json!({ "op": "And", "searchTerms": [] })),
            Err(DataAccessError::Validation(_))
        ));
    }

    #[test]
    fn test_should_yield_nothing_for_untranslatable_operators() {
        assert!(parse(&json!({ "op": "Not", "left": "a", "right": 1 })).unwrap().is_none());
        assert!(parse(&json!({ "op": "Contains", "left": "a", "right": "x" })).unwrap().is_none());
    }

    #[test]
    fn test_should_skip_untranslatable_children() {
        let expr = parse(&json!({
            "op": "And",
            "searchTerms": [
                { "op": "Contains", "left": "a", "right": "x" },
                { "op": "Eq", "left": "b", "right": true }
            ]
        }))
        .unwrap()
        .unwrap();

        let SearchExpression::Logical(root) = expr else {
            panic!("expected logical root");
        };
        assert_eq!(root.terms().len(), 1);
    }

    #[test]
    fn test_should_fail_on_unknown_operator() {
        assert!(matches!(
            parse(&json!({ "op": "Like", "left": "a", "right": "x" })),
            Err(DataAccessError::Parse(_))
        ));
        assert!(matches!(parse(&json!({ "left": "a" })), Err(DataAccessError::Parse(_))));
    }

    #[test]
    fn test_should_require_string_left_operand() {
        assert!(matches!(
            parse(&json!({ "op": "Eq", "left": 4, "right": "x" })),
            Err(DataAccessError::Validation(_))
        ));
    }

    #[test]
    fn test_should_infer_scalar_literal_types() {
        assert_eq!(parse_literal(&json!(5)).unwrap(), QueryTerm::Integer(5));
        assert_eq!(parse_literal(&json!(2.5)).unwrap(), QueryTerm::Double(2.5));
        assert_eq!(parse_literal(&json!(false)).unwrap(), QueryTerm::Boolean(false));
        assert_eq!(parse_literal(&json!(null)).unwrap(), QueryTerm::Null);
        assert_eq!(parse_literal(&json!("Foo")).unwrap(), QueryTerm::String("Foo".into()));
    }

    #[test]
    fn test_should_convert_dates_to_utc() {
        let term = parse_literal(&json!("2024-05-01T12:00:00+02:00")).unwrap();
        assert_eq!(term, QueryTerm::Date(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap()));

        let naive = parse_literal(&json!("2024-05-01T12:00:00")).unwrap();
        assert_eq!(naive, QueryTerm::Date(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()));
    }

    #[test]
    fn test_should_infer_array_type_from_first_element() {
        assert_eq!(parse_literal(&json!([1, 2])).unwrap(), QueryTerm::IntegerArray(vec![1, 2]));
        assert_eq!(parse_literal(&json!([1.5, 2])).unwrap(), QueryTerm::DoubleArray(vec![1.5, 2.0]));
        assert_eq!(
            parse_literal(&json!(["a", "b"])).unwrap(),
            QueryTerm::StringArray(vec!["a".into(), "b".into()])
        );
        assert_eq!(parse_literal(&json!([])).unwrap(), QueryTerm::Null);
        assert_eq!(parse_literal(&json!([null, 1])).unwrap(), QueryTerm::Null);
    }

    #[test]
    fn test_should_reject_mixed_arrays() {
        assert!(matches!(
            parse_literal(&json!([1, "a"])),
            Err(DataAccessError::Validation(_))
        ));
    }

    #[test]
    fn test_should_keep_missing_right_operand_absent() {
        let binary = parse_binary_node(json!({ "op": "Eq", "left": "isDeleted" }));
        assert!(binary.right().is_none());
    }
}
