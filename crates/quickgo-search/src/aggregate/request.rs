//! Aggregation requests and their Solr `json.facet` rendering.

use serde::Serialize;

use super::AggregateFunction;
use crate::error::{FilterError, FilterResult};

pub const AGG_TYPE_PREFIX: &str = "agg";
pub const AGG_NAME_SEPARATOR: char = '_';
pub const FACET_TYPE_TERMS: &str = "terms";

const DECLARATION_SEPARATOR: &str = ",";
const NAME_TO_VALUE_SEPARATOR: &str = ":";
const FACET_MARKER: &str = "facet";

/// `count_geneProductId`: key of a function's result in a response.
pub fn aggregate_field_title(function: AggregateFunction, field: &str) -> String {
    format!("{}{AGG_NAME_SEPARATOR}{field}", function.name())
}

/// `agg_goId`: key of a nested aggregation in a response.
pub fn aggregate_type_title(name: &str) -> String {
    format!("{AGG_TYPE_PREFIX}{AGG_NAME_SEPARATOR}{name}")
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AggregateField {
    pub function: AggregateFunction,
    pub field: String,
}

/// A named aggregation: functions over fields plus nested term aggregations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateRequest {
    name: String,
    fields: Vec<AggregateField>,
    nested: Vec<AggregateRequest>,
}

impl AggregateRequest {
    pub fn new(name: &str) -> FilterResult<Self> {
        if name.trim().is_empty() {
            return Err(FilterError::InvalidArgument(
                "Cannot create aggregate with null or empty name".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            fields: Vec::new(),
            nested: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[AggregateField] {
        &self.fields
    }

    pub fn nested_aggregates(&self) -> &[AggregateRequest] {
        &self.nested
    }

    pub fn add_field(
        &mut self,
        field: &str,
        function: AggregateFunction,
    ) -> FilterResult<&mut Self> {
        if field.trim().is_empty() {
            return Err(FilterError::InvalidArgument(
                "Cannot aggregate over a null or empty field".to_string(),
            ));
        }
        let field = AggregateField {
            function,
            field: field.to_string(),
        };
        if !self.fields.contains(&field) {
            self.fields.push(field);
        }
        Ok(self)
    }

    pub fn add_nested_aggregate(&mut self, aggregate: AggregateRequest) -> &mut Self {
        if !self.nested.contains(&aggregate) {
            self.nested.push(aggregate);
        }
        self
    }

    /// Solr `json.facet` declaration, e.g.
    /// `{count_annotation:"count(annotation)",agg_goId:{type:terms,field:goId}}`.
    pub fn to_facet_json(&self) -> String {
        let declarations: Vec<String> = self
            .fields
            .iter()
            .map(|f| {
                format!(
                    "{}{NAME_TO_VALUE_SEPARATOR}\"{}({})\"",
                    aggregate_field_title(f.function, &f.field),
                    f.function.name(),
                    f.field
                )
            })
            .chain(self.nested.iter().map(AggregateRequest::sub_facet))
            .collect();

        format!("{{{}}}", declarations.join(DECLARATION_SEPARATOR))
    }

    fn sub_facet(&self) -> String {
        let mut parts = vec![
            format!("type{NAME_TO_VALUE_SEPARATOR}{FACET_TYPE_TERMS}"),
            format!("field{NAME_TO_VALUE_SEPARATOR}{}", self.name),
        ];
        if !self.fields.is_empty() {
            parts.push(format!(
                "{FACET_MARKER}{NAME_TO_VALUE_SEPARATOR}{}",
                self.to_facet_json()
            ));
        }

        format!(
            "{}{NAME_TO_VALUE_SEPARATOR}{{{}}}",
            aggregate_type_title(&self.name),
            parts.join(DECLARATION_SEPARATOR)
        )
    }
}
