//! Backend-agnostic search expressions.
//!
//! A [`SearchExpression`] is either a leaf [`BinaryExpression`] (`attribute <op> literal`) or a
//! [`LogicalExpression`] joining child expressions with `And`/`Or`. Backends translate or
//! evaluate the tree through the [`SearchExpressionVisitor`] trait.
//!
//! # Building expressions
//!
//! ```ignore
//! use nosqlayer_core::expression::SearchExpression;
//!
//! let expr = SearchExpression::and([
//!     SearchExpression::eq("status", "active"),
//!     SearchExpression::gt("age", 18),
//! ]);
//! ```
//!
//! # Parent paths
//!
//! A parent attribute path can be pushed down the tree with
//! [`SearchExpression::with_parent`]. Setting it on a logical node propagates it to every
//! descendant, and a binary node then addresses `parent.left`.

use std::{fmt, str::FromStr};

use crate::{
    constants::IS_DELETED,
    error::{DataAccessError, DataAccessResult},
    term::QueryTerm,
};

/// Operators accepted in search criteria payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    And,
    Or,
    Not,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    Between,
    Contains,
}

impl QueryOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryOperator::And => "And",
            QueryOperator::Or => "Or",
            QueryOperator::Not => "Not",
            QueryOperator::Eq => "Eq",
            QueryOperator::Ne => "Ne",
            QueryOperator::Lt => "Lt",
            QueryOperator::Lte => "Lte",
            QueryOperator::Gt => "Gt",
            QueryOperator::Gte => "Gte",
            QueryOperator::In => "In",
            QueryOperator::Between => "Between",
            QueryOperator::Contains => "Contains",
        }
    }
}

impl FromStr for QueryOperator {
    type Err = DataAccessError;

    /// Operator names are matched case-sensitively.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value {
            "And" => QueryOperator::And,
            "Or" => QueryOperator::Or,
            "Not" => QueryOperator::Not,
            "Eq" => QueryOperator::Eq,
            "Ne" => QueryOperator::Ne,
            "Lt" => QueryOperator::Lt,
            "Lte" => QueryOperator::Lte,
            "Gt" => QueryOperator::Gt,
            "Gte" => QueryOperator::Gte,
            "In" => QueryOperator::In,
            "Between" => QueryOperator::Between,
            "Contains" => QueryOperator::Contains,
            other => {
                return Err(DataAccessError::Parse(format!(
                    "'{other}' is not a recognized query operator"
                )));
            }
        })
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The two operators a [`LogicalExpression`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl From<LogicalOperator> for QueryOperator {
    fn from(op: LogicalOperator) -> Self {
        match op {
            LogicalOperator::And => QueryOperator::And,
            LogicalOperator::Or => QueryOperator::Or,
        }
    }
}

/// A leaf predicate comparing an attribute against a literal.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression {
    op: QueryOperator,
    left: String,
    right: Option<QueryTerm>,
    parent: Option<String>,
}

impl BinaryExpression {
    pub fn new(op: QueryOperator, left: impl Into<String>, right: Option<QueryTerm>) -> Self {
        Self {
            op,
            left: left.into(),
            right,
            parent: None,
        }
    }

    pub fn op(&self) -> QueryOperator {
        self.op
    }

    /// The attribute name, without any parent prefix.
    pub fn left(&self) -> &str {
        &self.left
    }

    pub fn right(&self) -> Option<&QueryTerm> {
        self.right.as_ref()
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Returns `parent.left` when a parent path is set, otherwise `left`.
    pub fn attribute_path(&self) -> String {
        match &self.parent {
            Some(parent) => format!("{parent}.{}", self.left),
            None => self.left.clone(),
        }
    }

    /// Whether this node is the soft-delete marker rather than a real predicate.
    pub fn is_soft_delete_marker(&self) -> bool {
        self.left == IS_DELETED
    }
}

impl fmt::Display for BinaryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.right {
            Some(right) => write!(f, "{} {} {}", self.attribute_path(), self.op, right),
            None => write!(f, "{} {} null", self.attribute_path(), self.op),
        }
    }
}

/// An `And`/`Or` over child expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpression {
    op: LogicalOperator,
    terms: Vec<SearchExpression>,
    parent: Option<String>,
}

impl LogicalExpression {
    pub fn new(op: LogicalOperator, terms: Vec<SearchExpression>) -> Self {
        Self { op, terms, parent: None }
    }

    pub fn op(&self) -> LogicalOperator {
        self.op
    }

    pub fn terms(&self) -> &[SearchExpression] {
        &self.terms
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }
}

/// The search expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchExpression {
    Binary(BinaryExpression),
    Logical(LogicalExpression),
}

impl SearchExpression {
    pub fn binary(op: QueryOperator, left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        SearchExpression::Binary(BinaryExpression::new(op, left, Some(right.into())))
    }

    pub fn eq(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Eq, left, right)
    }

    pub fn ne(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Ne, left, right)
    }

    pub fn gt(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Gt, left, right)
    }

    pub fn gte(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Gte, left, right)
    }

    pub fn lt(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Lt, left, right)
    }

    pub fn lte(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::Lte, left, right)
    }

    /// Membership test. The right operand should be an array term.
    pub fn is_in(left: impl Into<String>, right: impl Into<QueryTerm>) -> Self {
        Self::binary(QueryOperator::In, left, right)
    }

    pub fn and(terms: impl IntoIterator<Item = SearchExpression>) -> Self {
        SearchExpression::Logical(LogicalExpression::new(
            LogicalOperator::And,
            terms.into_iter().collect(),
        ))
    }

    pub fn or(terms: impl IntoIterator<Item = SearchExpression>) -> Self {
        SearchExpression::Logical(LogicalExpression::new(
            LogicalOperator::Or,
            terms.into_iter().collect(),
        ))
    }

    /// Marks the expression as "exclude soft-deleted items".
    pub fn not_deleted() -> Self {
        SearchExpression::Binary(BinaryExpression::new(QueryOperator::Eq, IS_DELETED, None))
    }

    /// Sets the parent attribute path on this node and every descendant.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        let parent: String = parent.into();
        self.set_parent(&parent);
        self
    }

    fn set_parent(&mut self, parent: &str) {
        match self {
            SearchExpression::Binary(binary) => binary.parent = Some(parent.to_string()),
            SearchExpression::Logical(logical) => {
                logical.parent = Some(parent.to_string());
                for term in logical.terms.iter_mut() {
                    term.set_parent(parent);
                }
            }
        }
    }

    /// Whether any binary node in the tree has `left == attribute`.
    pub fn references_attribute(&self, attribute: &str) -> bool {
        match self {
            SearchExpression::Binary(binary) => binary.left == attribute,
            SearchExpression::Logical(logical) => logical
                .terms
                .iter()
                .any(|term| term.references_attribute(attribute)),
        }
    }

    /// Checks the shape required before a search is sent to a backend: a logical root must have
    /// children and a binary root must carry both operands unless it is the soft-delete marker.
    pub fn validate(&self) -> DataAccessResult<()> {
        match self {
            SearchExpression::Logical(logical) if logical.terms.is_empty() => Err(
                DataAccessError::Validation("a logical search expression cannot be empty".into()),
            ),
            SearchExpression::Binary(binary)
                if binary.left.is_empty()
                    || (binary.right.is_none() && !binary.is_soft_delete_marker()) =>
            {
                Err(DataAccessError::Validation(format!(
                    "the operands of binary expression '{binary}' cannot be null"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Returns a copy of the tree with every binary attribute name passed through `rename`.
    pub fn map_attributes(&self, rename: &impl Fn(&str) -> String) -> SearchExpression {
        match self {
            SearchExpression::Binary(binary) => SearchExpression::Binary(BinaryExpression {
                left: rename(&binary.left),
                ..binary.clone()
            }),
            SearchExpression::Logical(logical) => SearchExpression::Logical(LogicalExpression {
                op: logical.op,
                terms: logical
                    .terms
                    .iter()
                    .map(|term| term.map_attributes(rename))
                    .collect(),
                parent: logical.parent.clone(),
            }),
        }
    }
}

/// Visitor over a [`SearchExpression`] tree.
///
/// Query compilers implement this with `Output = String`, in-memory evaluators with
/// `Output = bool`.
pub trait SearchExpressionVisitor {
    type Output;
    type Error: Into<DataAccessError>;

    fn visit_and(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error>;
    fn visit_or(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error>;
    fn visit_binary(&mut self, binary: &BinaryExpression) -> Result<Self::Output, Self::Error>;

    fn visit_expr(&mut self, expr: &SearchExpression) -> Result<Self::Output, Self::Error> {
        match expr {
            SearchExpression::Binary(binary) => self.visit_binary(binary),
            SearchExpression::Logical(logical) => match logical.op {
                LogicalOperator::And => self.visit_and(&logical.terms),
                LogicalOperator::Or => self.visit_or(&logical.terms),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_operator_names_case_sensitively() {
        assert_eq!("Gte".parse::<QueryOperator>().unwrap(), QueryOperator::Gte);
        assert!(matches!("gte".parse::<QueryOperator>(), Err(DataAccessError::Parse(_))));
    }

    #[test]
    fn test_should_propagate_parent_to_descendants() {
        let expr = SearchExpression::or([
            SearchExpression::eq("city", "Oslo"),
            SearchExpression::and([SearchExpression::eq("zip", "0150")]),
        ])
        .with_parent("address");

        let SearchExpression::Logical(root) = &expr else {
            panic!("expected logical root");
        };
        assert_eq!(root.parent(), Some("address"));

        let SearchExpression::Binary(first) = &root.terms()[0] else {
            panic!("expected binary child");
        };
        assert_eq!(first.attribute_path(), "address.city");

        let SearchExpression::Logical(nested) = &root.terms()[1] else {
            panic!("expected logical child");
        };
        let SearchExpression::Binary(zip) = &nested.terms()[0] else {
            panic!("expected binary grandchild");
        };
        assert_eq!(zip.attribute_path(), "address.zip");
    }

    #[test]
    fn test_should_find_soft_delete_marker_anywhere_in_tree() {
        let expr = SearchExpression::and([
            SearchExpression::eq("name", "x"),
            SearchExpression::or([SearchExpression::not_deleted()]),
        ]);
        assert!(expr.references_attribute(IS_DELETED));
        assert!(!SearchExpression::eq("name", "x").references_attribute(IS_DELETED));
    }

    #[test]
    fn test_should_reject_empty_logical_root() {
        let expr = SearchExpression::and(Vec::new());
        assert!(matches!(expr.validate(), Err(DataAccessError::Validation(_))));
    }

    #[test]
    fn test_should_reject_binary_without_right_operand() {
        let expr = SearchExpression::Binary(BinaryExpression::new(QueryOperator::Eq, "name", None));
        assert!(matches!(expr.validate(), Err(DataAccessError::Validation(_))));
        assert!(SearchExpression::not_deleted().validate().is_ok());
    }

    #[test]
    fn test_should_rename_attributes_without_touching_source() {
        let expr = SearchExpression::and([SearchExpression::eq("userId", "u1")]);
        let renamed = expr.map_attributes(&|name: &str| {
            if name == "userId" { "uid".to_string() } else { name.to_string() }
        });

        assert!(expr.references_attribute("userId"));
        assert!(renamed.references_attribute("uid"));
        assert!(!renamed.references_attribute("userId"));
    }

    #[test]
    fn test_should_display_binary_expression() {
        let SearchExpression::Binary(binary) = SearchExpression::eq("name", "Foo") else {
            panic!("expected binary");
        };
        assert_eq!(binary.to_string(), "name Eq Foo");
    }
}
