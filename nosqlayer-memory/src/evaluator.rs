//! Search expression evaluation against in-memory items.
//!
//! The evaluator mirrors the SQL the Cosmos compiler emits: soft-delete marker nodes are
//! not predicates, and neither is a logical node holding only markers. Such blank nodes drop
//! out of their enclosing join, and a filter that is blank throughout matches every item.
//! Whenever a filter references the marker, items with `isDeleted == true` are excluded.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

use nosqlayer_core::{
    constants::IS_DELETED,
    document::Item,
    error::{DataAccessError, DataAccessResult},
    expression::{BinaryExpression, QueryOperator, SearchExpression, SearchExpressionVisitor},
    term::QueryTerm,
};

/// Comparable view over JSON values and query terms.
///
/// Numbers are normalized to `f64`; strings that hold RFC 3339 date-times compare as dates
/// against date terms.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime<Utc>),
    String(&'a str),
    /// Arrays and objects only compare for equality against themselves.
    Opaque(&'a Value),
}

impl<'a> From<&'a Value> for Comparable<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::Null => Comparable::Null,
            Value::Bool(value) => Comparable::Bool(*value),
            Value::Number(value) => value
                .as_f64()
                .map(Comparable::Number)
                .unwrap_or(Comparable::Null),
            Value::String(value) => Comparable::String(value),
            other => Comparable::Opaque(other),
        }
    }
}

impl<'a> From<&'a QueryTerm> for Comparable<'a> {
    fn from(term: &'a QueryTerm) -> Self {
        match term {
            QueryTerm::String(value) => Comparable::String(value),
            QueryTerm::Integer(value) => Comparable::Number(*value as f64),
            QueryTerm::Double(value) => Comparable::Number(*value),
            QueryTerm::Boolean(value) => Comparable::Bool(*value),
            QueryTerm::Date(value) => Comparable::DateTime(*value),
            _ => Comparable::Null,
        }
    }
}

fn as_date(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|date| date.with_timezone(&Utc))
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::String(a), Comparable::DateTime(b))
            | (Comparable::DateTime(b), Comparable::String(a)) => as_date(a) == Some(*b),
            (Comparable::Opaque(a), Comparable::Opaque(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::DateTime(b)) => as_date(a)?.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::String(b)) => a.partial_cmp(&as_date(b)?),
            _ => None,
        }
    }
}

/// Resolves a dotted attribute path (`address.zip`) against an item.
pub(crate) fn lookup<'a>(item: &'a Item, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let first = segments.next()?;
    segments.try_fold(item.get(first)?, |value, segment| value.get(segment))
}

pub(crate) struct ItemEvaluator<'a> {
    item: &'a Item,
}

impl<'a> ItemEvaluator<'a> {
    pub fn new(item: &'a Item) -> Self {
        Self { item }
    }

    pub fn evaluate(&mut self, expr: &SearchExpression) -> DataAccessResult<bool> {
        Ok(self.visit_expr(expr)?.unwrap_or(true))
    }

    /// Keeps the items matching `filter`, applying the soft-delete guard when the filter
    /// references the marker attribute.
    pub fn filter_items(
        items: impl IntoIterator<Item = &'a Item>,
        filter: Option<&SearchExpression>,
    ) -> DataAccessResult<Vec<Item>> {
        let guard = filter.is_some_and(|expr| expr.references_attribute(IS_DELETED));
        let mut matched = Vec::new();

        for item in items {
            if guard && item.get(IS_DELETED) == Some(&Value::Bool(true)) {
                continue;
            }

            let keep = match filter {
                Some(expr) => ItemEvaluator::new(item).evaluate(expr)?,
                None => true,
            };

            if keep {
                matched.push(item.clone());
            }
        }

        Ok(matched)
    }
}

// `None` marks a blank node, one that holds no predicate at all.
impl<'a> SearchExpressionVisitor for ItemEvaluator<'a> {
    type Output = Option<bool>;
    type Error = DataAccessError;

    fn visit_and(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error> {
        let mut blank = true;

        for term in terms {
            match self.visit_expr(term)? {
                None => {}
                Some(false) => return Ok(Some(false)),
                Some(true) => blank = false,
            }
        }

        Ok((!blank).then_some(true))
    }

    fn visit_or(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error> {
        let mut blank = true;

        for term in terms {
            match self.visit_expr(term)? {
                None => {}
                Some(true) => return Ok(Some(true)),
                Some(false) => blank = false,
            }
        }

        Ok((!blank).then_some(false))
    }

    fn visit_binary(&mut self, binary: &BinaryExpression) -> Result<Self::Output, Self::Error> {
        if binary.is_soft_delete_marker() {
            return Ok(None);
        }

        self.matches_binary(binary).map(Some)
    }
}

impl<'a> ItemEvaluator<'a> {
    fn matches_binary(&self, binary: &BinaryExpression) -> DataAccessResult<bool> {
        let right = binary.right().ok_or_else(|| {
            DataAccessError::Argument("Binary expression must have both left and right terms.".into())
        })?;

        let path = binary.attribute_path();
        let field = lookup(self.item, &path);

        if right.is_null() {
            let is_null = matches!(field, None | Some(Value::Null));
            return Ok(match binary.op() {
                QueryOperator::Eq => is_null,
                QueryOperator::Ne => !is_null,
                _ => false,
            });
        }

        let Some(field) = field else {
            return Ok(false);
        };
        let left = Comparable::from(field);

        Ok(match binary.op() {
            QueryOperator::Eq => left == Comparable::from(right),
            QueryOperator::Ne => left != Comparable::from(right),
            QueryOperator::Gt | QueryOperator::Gte | QueryOperator::Lt | QueryOperator::Lte => {
                match left.partial_cmp(&Comparable::from(right)) {
                    Some(ordering) => match binary.op() {
                        QueryOperator::Gt => ordering == Ordering::Greater,
                        QueryOperator::Gte => ordering != Ordering::Less,
                        QueryOperator::Lt => ordering == Ordering::Less,
                        _ => ordering != Ordering::Greater,
                    },
                    None => false,
                }
            }
            QueryOperator::In => {
                if !right.is_array() || right.elements().is_empty() {
                    return Err(DataAccessError::Argument(
                        "The right-hand side of an IN operator must be a non-empty collection.".into(),
                    ));
                }
                right
                    .elements()
                    .iter()
                    .any(|element| left == Comparable::from(element))
            }
            QueryOperator::Between => {
                let bounds = right.elements();
                match bounds.as_slice() {
                    [low, high] => {
                        matches!(
                            left.partial_cmp(&Comparable::from(low)),
                            Some(Ordering::Greater | Ordering::Equal)
                        ) && matches!(
                            left.partial_cmp(&Comparable::from(high)),
                            Some(Ordering::Less | Ordering::Equal)
                        )
                    }
                    _ => {
                        return Err(DataAccessError::Argument(
                            "Between requires exactly two bounds.".into(),
                        ));
                    }
                }
            }
            op => {
                return Err(DataAccessError::Argument(format!(
                    "Unsupported query operator '{op}'."
                )));
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(value: Value) -> Item {
        value.as_object().cloned().unwrap()
    }

    fn evaluates(value: Value, expr: &SearchExpression) -> bool {
        ItemEvaluator::new(&item(value)).evaluate(expr).unwrap()
    }

    #[test]
    fn test_should_compare_numbers_across_integer_and_double() {
        let expr = SearchExpression::gte("score", 2.0);
        assert!(evaluates(json!({ "score": 2 }), &expr));
        assert!(!evaluates(json!({ "score": 1 }), &expr));
    }

    #[test]
    fn test_should_compare_date_strings_against_date_terms() {
        let cutoff = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let expr = SearchExpression::lt("createdAt", cutoff);
        assert!(evaluates(json!({ "createdAt": "2023-12-31T23:59:59.000Z" }), &expr));
        assert!(!evaluates(json!({ "createdAt": "2024-01-02T00:00:00.000Z" }), &expr));
    }

    #[test]
    fn test_should_evaluate_membership() {
        let expr = SearchExpression::is_in("status", vec!["a", "b"]);
        assert!(evaluates(json!({ "status": "b" }), &expr));
        assert!(!evaluates(json!({ "status": "c" }), &expr));

        let scalar = SearchExpression::is_in("status", "a");
        assert!(ItemEvaluator::new(&item(json!({ "status": "a" }))).evaluate(&scalar).is_err());
    }

    #[test]
    fn test_should_resolve_nested_paths() {
        let expr = SearchExpression::eq("zip", "0150").with_parent("address");
        assert!(evaluates(json!({ "address": { "zip": "0150" } }), &expr));
    }

    #[test]
    fn test_should_treat_marker_as_neutral_in_logical_joins() {
        let expr = SearchExpression::or([
            SearchExpression::not_deleted(),
            SearchExpression::eq("name", "Foo"),
        ]);
        assert!(evaluates(json!({ "name": "Foo" }), &expr));
        assert!(!evaluates(json!({ "name": "Bar" }), &expr));
    }

    #[test]
    fn test_should_drop_nested_marker_only_joins() {
        let expr = SearchExpression::or([
            SearchExpression::and([SearchExpression::not_deleted()]),
            SearchExpression::eq("title", "zz"),
        ]);
        assert!(!evaluates(json!({ "title": "a" }), &expr));
        assert!(evaluates(json!({ "title": "zz" }), &expr));

        let blank = SearchExpression::and([SearchExpression::or([SearchExpression::not_deleted()])]);
        assert!(evaluates(json!({ "title": "a" }), &blank));
    }

    #[test]
    fn test_should_exclude_deleted_items_when_marker_present() {
        let items = vec![
            item(json!({ "id": "1", "isDeleted": true })),
            item(json!({ "id": "2", "isDeleted": false })),
            item(json!({ "id": "3" })),
        ];

        let guarded = ItemEvaluator::filter_items(&items, Some(&SearchExpression::not_deleted())).unwrap();
        assert_eq!(guarded.len(), 2);

        let unguarded = ItemEvaluator::filter_items(&items, None).unwrap();
        assert_eq!(unguarded.len(), 3);
    }
}
