//! Serialises [`QuickGoQuery`] trees into Solr query strings.

use std::collections::HashSet;
use std::fmt;

use super::model::{JoinQuery, QueryKind, QuickGoQuery};

pub const SOLR_FIELD_SEPARATOR: &str = ":";
const ALL_QUERY: &str = "*:*";
const WILDCARD: &str = "*";

/// Renders queries as standard Lucene syntax.
///
/// Fields registered as terms-compatible are rendered with the terms query
/// parser instead: a disjunction over a single such field becomes one
/// `({!terms f=field}v1,v2)` clause, which Solr evaluates without scoring.
#[derive(Debug, Clone, Default)]
pub struct SolrQuerySerializer {
    terms_fields: HashSet<String>,
}

impl SolrQuerySerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_terms_fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            terms_fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn serialize(&self, query: &QuickGoQuery) -> String {
        match query.kind() {
            QueryKind::Field { field, value } => {
                if self.terms_fields.contains(field) {
                    terms_query(field, [value.as_str()])
                } else {
                    field_query(field, &escape_value(value))
                }
            }
            QueryKind::Contains { field, value } => {
                field_query(field, &format!("*{}*", escape_query_chars(value)))
            }
            QueryKind::Value { value } => format!("({})", escape_query_chars(value)),
            QueryKind::AllNonEmpty { field } => field_query(field, WILDCARD),
            QueryKind::All => ALL_QUERY.to_string(),
            QueryKind::And { queries } => self.join_all(queries, " AND "),
            QueryKind::Or { queries } => match self.single_terms_field(queries) {
                Some(field) => terms_query(field, queries.iter().filter_map(leaf_value)),
                None => self.join_all(queries, " OR "),
            },
            QueryKind::Not { query } => format!("NOT ({})", self.serialize(query)),
            QueryKind::Join(join) => self.join_query(join),
        }
    }

    fn join_all(&self, queries: &[QuickGoQuery], operator: &str) -> String {
        let parts: Vec<String> = queries.iter().map(|q| self.serialize(q)).collect();
        format!("({})", parts.join(operator))
    }

    fn join_query(&self, join: &JoinQuery) -> String {
        let filter = join
            .filter
            .as_deref()
            .map(|filter| self.serialize(filter))
            .unwrap_or_default();
        format!(
            "{{!join from={} to={} fromIndex={}}} {}",
            join.from_attribute, join.to_attribute, join.from_table, filter
        )
    }

    /// The field shared by every child, when all are equality leaves on one
    /// terms-compatible field.
    fn single_terms_field<'a>(&self, queries: &'a [QuickGoQuery]) -> Option<&'a str> {
        let mut shared: Option<&str> = None;
        for query in queries {
            let QueryKind::Field { field, .. } = query.kind() else {
                return None;
            };
            if !self.terms_fields.contains(field) {
                return None;
            }
            match shared {
                Some(existing) if existing != field.as_str() => return None,
                _ => shared = Some(field.as_str()),
            }
        }
        shared
    }
}

impl fmt::Display for QuickGoQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&SolrQuerySerializer::new().serialize(self))
    }
}

fn leaf_value(query: &QuickGoQuery) -> Option<&str> {
    match query.kind() {
        QueryKind::Field { value, .. } => Some(value),
        _ => None,
    }
}

fn field_query(field: &str, value: &str) -> String {
    format!("({field}{SOLR_FIELD_SEPARATOR}{value})")
}

fn terms_query<'a>(field: &str, values: impl IntoIterator<Item = &'a str>) -> String {
    let values: Vec<String> = values.into_iter().map(str::to_lowercase).collect();
    format!("({{!terms f={field}}}{})", values.join(","))
}

fn escape_value(value: &str) -> String {
    if value == WILDCARD {
        return value.to_string();
    }
    escape_query_chars(value)
}

/// Backslash-escapes characters with meaning in the Lucene query syntax.
pub fn escape_query_chars(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(
            c,
            '\\' | '+'
                | '-'
                | '!'
                | '('
                | ')'
                | ':'
                | '^'
                | '['
                | ']'
                | '"'
                | '{'
                | '}'
                | '~'
                | '*'
                | '?'
                | '|'
                | '&'
                | ';'
                | '/'
        ) || c.is_whitespace()
        {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
