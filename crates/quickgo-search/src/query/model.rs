//! The QuickGO boolean query tree.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use crate::error::{FilterError, FilterResult};

/// An immutable boolean query expression.
///
/// Built only through the factory functions below so the tree invariants hold:
/// leaves have a non-blank field, AND/OR hold at least one distinct child, and
/// joins name both sides fully.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QuickGoQuery {
    kind: QueryKind,
}

/// The shape of a [`QuickGoQuery`] node, exposed read-only for matching.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryKind {
    /// `field` equals `value`.
    Field { field: String, value: String },
    /// `field` contains `value` anywhere.
    Contains { field: String, value: String },
    /// A bare value searched across the default fields.
    Value { value: String },
    /// `field` holds any non-empty value.
    AllNonEmpty { field: String },
    /// Matches every document.
    All,
    And { queries: Vec<QuickGoQuery> },
    Or { queries: Vec<QuickGoQuery> },
    Not { query: Box<QuickGoQuery> },
    Join(JoinQuery),
}

/// A cross-collection join, optionally restricting the "from" side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct JoinQuery {
    pub from_table: String,
    pub from_attribute: String,
    pub to_table: String,
    pub to_attribute: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Box<QuickGoQuery>>,
}

impl QuickGoQuery {
    /// Leaf matching `field` equal to `value`.
    pub fn create_query(field: &str, value: &str) -> FilterResult<Self> {
        check_field(field)?;
        Ok(Self::from_kind(QueryKind::Field {
            field: field.to_string(),
            value: value.to_string(),
        }))
    }

    /// Leaf matching `field` containing `value`.
    pub fn create_contain_query(field: &str, value: &str) -> FilterResult<Self> {
        check_field(field)?;
        Ok(Self::from_kind(QueryKind::Contains {
            field: field.to_string(),
            value: value.to_string(),
        }))
    }

    /// Value-only leaf, matched against the collection's default fields.
    pub fn create_value_query(value: &str) -> FilterResult<Self> {
        if value.trim().is_empty() {
            return Err(FilterError::InvalidArgument(
                "Value cannot be null or empty".to_string(),
            ));
        }
        Ok(Self::from_kind(QueryKind::Value {
            value: value.to_string(),
        }))
    }

    /// Leaf matching documents where `field` has any value at all.
    pub fn create_all_non_empty_field_query(field: &str) -> FilterResult<Self> {
        check_field(field)?;
        Ok(Self::from_kind(QueryKind::AllNonEmpty {
            field: field.to_string(),
        }))
    }

    pub fn create_all_query() -> Self {
        Self::from_kind(QueryKind::All)
    }

    /// `NOT(*:*)`: the query that matches nothing.
    pub fn filter_everything() -> Self {
        Self::not(Self::create_all_query())
    }

    /// Conjunction of `queries`.
    ///
    /// Nested conjunctions are flattened and duplicates collapse. A single
    /// remaining operand is returned as is.
    pub fn and(queries: impl IntoIterator<Item = QuickGoQuery>) -> FilterResult<Self> {
        combine(queries, Connective::And)
    }

    /// Disjunction of `queries`, flattened like [`QuickGoQuery::and`].
    pub fn or(queries: impl IntoIterator<Item = QuickGoQuery>) -> FilterResult<Self> {
        combine(queries, Connective::Or)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(query: QuickGoQuery) -> Self {
        Self::from_kind(QueryKind::Not {
            query: Box::new(query),
        })
    }

    pub fn create_join_query(
        from_table: &str,
        from_attribute: &str,
        to_table: &str,
        to_attribute: &str,
    ) -> FilterResult<Self> {
        Self::join(from_table, from_attribute, to_table, to_attribute, None)
    }

    pub fn create_join_query_with_filter(
        from_table: &str,
        from_attribute: &str,
        to_table: &str,
        to_attribute: &str,
        filter: QuickGoQuery,
    ) -> FilterResult<Self> {
        Self::join(
            from_table,
            from_attribute,
            to_table,
            to_attribute,
            Some(Box::new(filter)),
        )
    }

    fn join(
        from_table: &str,
        from_attribute: &str,
        to_table: &str,
        to_attribute: &str,
        filter: Option<Box<QuickGoQuery>>,
    ) -> FilterResult<Self> {
        for (name, value) in [
            ("from table", from_table),
            ("from attribute", from_attribute),
            ("to table", to_table),
            ("to attribute", to_attribute),
        ] {
            if value.trim().is_empty() {
                return Err(FilterError::InvalidArgument(format!(
                    "Join {name} cannot be null or empty"
                )));
            }
        }

        Ok(Self::from_kind(QueryKind::Join(JoinQuery {
            from_table: from_table.to_string(),
            from_attribute: from_attribute.to_string(),
            to_table: to_table.to_string(),
            to_attribute: to_attribute.to_string(),
            filter,
        })))
    }

    pub fn kind(&self) -> &QueryKind {
        &self.kind
    }

    /// Children of an AND/OR node, empty for anything else.
    pub fn children(&self) -> &[QuickGoQuery] {
        match &self.kind {
            QueryKind::And { queries } | QueryKind::Or { queries } => queries,
            _ => &[],
        }
    }

    fn from_kind(kind: QueryKind) -> Self {
        Self { kind }
    }
}

impl std::ops::Not for QuickGoQuery {
    type Output = QuickGoQuery;

    fn not(self) -> Self::Output {
        QuickGoQuery::not(self)
    }
}

#[derive(Clone, Copy)]
enum Connective {
    And,
    Or,
}

fn combine(
    queries: impl IntoIterator<Item = QuickGoQuery>,
    connective: Connective,
) -> FilterResult<QuickGoQuery> {
    let mut members: Vec<QuickGoQuery> = Vec::new();

    for query in queries {
        let nested = match (connective, query.kind) {
            (Connective::And, QueryKind::And { queries })
            | (Connective::Or, QueryKind::Or { queries }) => queries,
            (_, kind) => vec![QuickGoQuery { kind }],
        };
        for member in nested {
            if !members.contains(&member) {
                members.push(member);
            }
        }
    }

    match members.len() {
        0 => Err(FilterError::InvalidArgument(
            "Cannot combine an empty list of queries".to_string(),
        )),
        1 => Ok(members.remove(0)),
        _ => Ok(QuickGoQuery::from_kind(match connective {
            Connective::And => QueryKind::And { queries: members },
            Connective::Or => QueryKind::Or { queries: members },
        })),
    }
}

fn check_field(field: &str) -> FilterResult<()> {
    if field.trim().is_empty() {
        return Err(FilterError::InvalidArgument(
            "Field cannot be null or empty".to_string(),
        ));
    }
    Ok(())
}

/// Members are deduplicated on construction, so equal length plus
/// containment means equal sets.
fn same_members(left: &[QuickGoQuery], right: &[QuickGoQuery]) -> bool {
    left.len() == right.len() && left.iter().all(|query| right.contains(query))
}

fn unordered_hash(queries: &[QuickGoQuery]) -> u64 {
    queries
        .iter()
        .map(|query| {
            let mut hasher = DefaultHasher::new();
            query.hash(&mut hasher);
            hasher.finish()
        })
        .fold(0u64, u64::wrapping_add)
}

impl PartialEq for QueryKind {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                QueryKind::Field { field, value },
                QueryKind::Field {
                    field: other_field,
                    value: other_value,
                },
            )
            | (
                QueryKind::Contains { field, value },
                QueryKind::Contains {
                    field: other_field,
                    value: other_value,
                },
            ) => field == other_field && value == other_value,
            (QueryKind::Value { value }, QueryKind::Value { value: other }) => value == other,
            (QueryKind::AllNonEmpty { field }, QueryKind::AllNonEmpty { field: other }) => {
                field == other
            }
            (QueryKind::All, QueryKind::All) => true,
            (QueryKind::And { queries }, QueryKind::And { queries: others })
            | (QueryKind::Or { queries }, QueryKind::Or { queries: others }) => {
                same_members(queries, others)
            }
            (QueryKind::Not { query }, QueryKind::Not { query: other }) => query == other,
            (QueryKind::Join(join), QueryKind::Join(other)) => join == other,
            _ => false,
        }
    }
}

impl Eq for QueryKind {}

impl Hash for QueryKind {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            QueryKind::Field { field, value } | QueryKind::Contains { field, value } => {
                field.hash(state);
                value.hash(state);
            }
            QueryKind::Value { value } => value.hash(state),
            QueryKind::AllNonEmpty { field } => field.hash(state),
            QueryKind::All => {}
            QueryKind::And { queries } | QueryKind::Or { queries } => {
                queries.len().hash(state);
                unordered_hash(queries).hash(state);
            }
            QueryKind::Not { query } => query.hash(state),
            QueryKind::Join(join) => join.hash(state),
        }
    }
}
