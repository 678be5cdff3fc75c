//! Compilation of search expressions and find options into Cosmos SQL.
//!
//! Every compiled query is scoped to one partition and selects from the alias `c`:
//!
//! ```text
//! SELECT <projection> FROM c WHERE c.<pk> = '<pv>'
//!     [ AND (IS_DEFINED(c.isDeleted) = false OR c.isDeleted = false)]
//!     [ AND <filter>]
//!     [ ORDER BY c.<field> ASC|DESC]
//!     [ OFFSET <skip> LIMIT <limit>]
//! ```
//!
//! The soft-delete guard is appended once whenever the filter references `isDeleted`
//! anywhere; the marker nodes themselves compile to nothing.

use chrono::{DateTime, Utc};
use serde_json::Value;

use nosqlayer_core::{
    backend::QueryDefinition,
    constants::{ID, IS_DELETED},
    error::{DataAccessError, DataAccessResult},
    expression::{BinaryExpression, QueryOperator, SearchExpression, SearchExpressionVisitor},
    options::{FindOptions, SortDirection, SortField},
    parser,
    schema::{ContainerConfiguration, FieldAliases},
    term::QueryTerm,
};

/// Named parameter carrying the attribute value of a key-value query.
pub const ATTRIBUTE_VALUE_PARAMETER: &str = "@attributeValue";

/// Name the partition key value is projected under in key-value queries.
pub const PARTITION_KEY_PROJECTION: &str = "pk";

const SOFT_DELETE_GUARD: &str = " AND (IS_DEFINED(c.isDeleted) = false OR c.isDeleted = false)";

/// Quotes a string literal, escaping embedded single quotes.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "\\'"))
}

/// Renders a date the way Cosmos stores them, with seven fractional digits.
fn date(value: &DateTime<Utc>) -> String {
    format!(
        "{}.{:07}Z",
        value.format("%Y-%m-%dT%H:%M:%S"),
        value.timestamp_subsec_nanos() / 100
    )
}

fn literal(term: &QueryTerm) -> String {
    match term {
        QueryTerm::String(value) => quote(value),
        QueryTerm::Date(value) => quote(&date(value)),
        QueryTerm::Boolean(value) => value.to_string(),
        QueryTerm::Integer(value) => value.to_string(),
        QueryTerm::Double(value) => value.to_string(),
        QueryTerm::Null => "null".to_string(),
        array => array
            .elements()
            .iter()
            .map(literal)
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn operator_token(op: QueryOperator) -> DataAccessResult<&'static str> {
    Ok(match op {
        QueryOperator::And => "AND",
        QueryOperator::Or => "OR",
        QueryOperator::In => "IN",
        QueryOperator::Eq => "=",
        QueryOperator::Gt => ">",
        QueryOperator::Lt => "<",
        QueryOperator::Gte => ">=",
        QueryOperator::Lte => "<=",
        _ => return Err(DataAccessError::Argument("Unsupported query operator.".into())),
    })
}

/// Translates a search expression into a Cosmos SQL filter clause.
///
/// Attribute names are resolved through the container's alias table; a name without an alias
/// is used as is.
pub(crate) struct CosmosQueryTranslator<'a> {
    aliases: &'a FieldAliases,
}

impl<'a> CosmosQueryTranslator<'a> {
    pub fn new(aliases: &'a FieldAliases) -> Self {
        Self { aliases }
    }

    fn join(&mut self, terms: &[SearchExpression], op: QueryOperator) -> DataAccessResult<String> {
        let token = operator_token(op)?;
        let parts = terms
            .iter()
            .map(|term| self.visit_expr(term))
            .collect::<DataAccessResult<Vec<_>>>()?
            .into_iter()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>();

        if parts.is_empty() {
            return Ok(String::new());
        }

        Ok(format!("({})", parts.join(&format!(" {token} "))))
    }
}

impl<'a> SearchExpressionVisitor for CosmosQueryTranslator<'a> {
    type Output = String;
    type Error = DataAccessError;

    fn visit_and(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error> {
        self.join(terms, QueryOperator::And)
    }

    fn visit_or(&mut self, terms: &[SearchExpression]) -> Result<Self::Output, Self::Error> {
        self.join(terms, QueryOperator::Or)
    }

    fn visit_binary(&mut self, binary: &BinaryExpression) -> Result<Self::Output, Self::Error> {
        if binary.is_soft_delete_marker() {
            return Ok(String::new());
        }

        let token = operator_token(binary.op())?;
        let right = binary.right().ok_or_else(|| {
            DataAccessError::Argument("Binary expression must have both left and right terms.".into())
        })?;

        let attribute = self.aliases.stored_name(binary.left());
        let path = match binary.parent() {
            Some(parent) => format!("c.{parent}.{attribute}"),
            None => format!("c.{attribute}"),
        };

        if binary.op() == QueryOperator::In {
            if !right.is_array() || right.elements().is_empty() {
                return Err(DataAccessError::Argument(
                    "The right-hand side of an IN operator must be a non-empty collection.".into(),
                ));
            }
            return Ok(format!("{path} IN ({})", literal(right)));
        }

        Ok(format!("{path} {token} {}", literal(right)))
    }
}

/// Builds [`QueryDefinition`]s for one container.
///
/// # Example
///
/// ```ignore
/// use nosqlayer_core::{expression::SearchExpression, schema::ContainerConfiguration};
/// use nosqlayer_cosmos::QueryCompiler;
///
/// let configuration = ContainerConfiguration::new("items", "/id");
/// let query = QueryCompiler::new(&configuration)
///     .find("p1", Some(&SearchExpression::eq("name", "Foo")), None)?;
///
/// assert_eq!(
///     query.text,
///     "SELECT * FROM c WHERE c.id = 'p1' AND c.name = 'Foo' OFFSET 0 LIMIT 100"
/// );
/// ```
#[derive(Debug, Clone)]
pub struct QueryCompiler<'a> {
    configuration: &'a ContainerConfiguration,
    aliases: FieldAliases,
}

impl<'a> QueryCompiler<'a> {
    pub fn new(configuration: &'a ContainerConfiguration) -> Self {
        Self {
            configuration,
            aliases: configuration.field_aliases(),
        }
    }

    /// Compiles a filter clause on its own. Returns an empty string when nothing but
    /// soft-delete markers remain.
    pub fn compile_filter(&self, criteria: &SearchExpression) -> DataAccessResult<String> {
        CosmosQueryTranslator::new(&self.aliases).visit_expr(criteria)
    }

    /// A paged, sorted and projected search inside one partition.
    pub fn find(
        &self,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
        options: Option<&FindOptions>,
    ) -> DataAccessResult<QueryDefinition> {
        let defaults = FindOptions::default();
        let options = options.unwrap_or(&defaults);

        let projection = options
            .projection_fields
            .iter()
            .filter(|field| !field.contains('*'))
            .map(|field| self.aliases.stored_name(field).to_string())
            .collect::<Vec<_>>();
        let select = if options.projection_fields.is_empty() {
            "*".to_string()
        } else {
            options
                .projection_fields
                .iter()
                .map(|field| {
                    if field.contains('*') {
                        field.clone()
                    } else {
                        format!("c.{}", self.aliases.stored_name(field))
                    }
                })
                .collect::<Vec<_>>()
                .join(",")
        };

        let sort = options.sort_field.as_ref().map(|sort| SortField {
            field_name: self.aliases.stored_name(&sort.field_name).to_string(),
            sort_direction: sort.sort_direction,
        });

        let mut query = self.scoped(&select, partition_value, criteria)?;
        if let Some(sort) = &sort {
            let direction = match sort.sort_direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            query.text.push_str(&format!(" ORDER BY c.{} {direction}", sort.field_name));
        }

        let (skip, limit) = (options.skip_or_default(), options.limit_or_default());
        query.text.push_str(&format!(" OFFSET {skip} LIMIT {limit}"));

        Ok(QueryDefinition {
            projection,
            sort,
            skip: Some(skip),
            limit: Some(limit),
            ..query
        })
    }

    /// A `COUNT(1)` query inside one partition. Each result row carries its count under `$1`.
    pub fn count(&self, partition_value: &str, criteria: Option<&SearchExpression>) -> DataAccessResult<QueryDefinition> {
        Ok(QueryDefinition {
            count: true,
            ..self.scoped("COUNT(1)", partition_value, criteria)?
        })
    }

    /// A cross-partition query selecting the id and partition key of every item whose
    /// `key_attribute` equals `value`. The partition key value comes back under
    /// [`PARTITION_KEY_PROJECTION`].
    pub fn key_value(&self, key_attribute: &str, value: &Value) -> DataAccessResult<QueryDefinition> {
        let partition_key = self.configuration.partition_key_name();
        let attribute = self.aliases.stored_name(key_attribute);
        let filter = SearchExpression::binary(QueryOperator::Eq, attribute, parser::parse_literal(value)?);

        Ok(QueryDefinition {
            partition_key: Some(partition_key.clone()),
            filter: Some(filter),
            projection: vec![
                ID.to_string(),
                format!("{partition_key} AS {PARTITION_KEY_PROJECTION}"),
            ],
            ..QueryDefinition::new(format!(
                "SELECT c.id, c.{partition_key} AS {PARTITION_KEY_PROJECTION} FROM c \
                 WHERE c.{attribute} = {ATTRIBUTE_VALUE_PARAMETER}"
            ))
        }
        .with_parameter(ATTRIBUTE_VALUE_PARAMETER, value.clone()))
    }

    fn scoped(
        &self,
        select: &str,
        partition_value: &str,
        criteria: Option<&SearchExpression>,
    ) -> DataAccessResult<QueryDefinition> {
        let partition_key = self.configuration.partition_key_name();
        let mut text = format!(
            "SELECT {select} FROM c WHERE c.{partition_key} = {}",
            quote(partition_value)
        );

        if let Some(criteria) = criteria {
            if criteria.references_attribute(IS_DELETED) {
                text.push_str(SOFT_DELETE_GUARD);
            }

            let filter = self.compile_filter(criteria)?;
            if !filter.trim().is_empty() {
                text.push_str(" AND ");
                text.push_str(&filter);
            }
        }

        Ok(QueryDefinition {
            partition_value: Some(partition_value.to_string()),
            partition_key: Some(partition_key),
            filter: criteria.map(|criteria| {
                criteria.map_attributes(&|name: &str| self.aliases.stored_name(name).to_string())
            }),
            ..QueryDefinition::new(text)
        })
    }
}
