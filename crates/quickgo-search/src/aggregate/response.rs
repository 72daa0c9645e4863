//! Aggregation results, built incrementally and then frozen.

use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::AggregateFunction;
use crate::error::{FilterError, FilterResult};

/// A function computed over a field, with its numeric outcome.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationResult {
    function: AggregateFunction,
    field: String,
    result: f64,
}

impl AggregationResult {
    pub fn new(function: AggregateFunction, field: &str, result: f64) -> Self {
        Self {
            function,
            field: field.to_string(),
            result,
        }
    }

    pub fn function(&self) -> AggregateFunction {
        self.function
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn result(&self) -> f64 {
        self.result
    }
}

// Compared bitwise so equal results hash equally.
impl PartialEq for AggregationResult {
    fn eq(&self, other: &Self) -> bool {
        self.function == other.function
            && self.field == other.field
            && self.result.to_bits() == other.result.to_bits()
    }
}

impl Eq for AggregationResult {}

impl Hash for AggregationResult {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.function.hash(state);
        self.field.hash(state);
        self.result.to_bits().hash(state);
    }
}

fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}

fn find_result<'a>(
    results: &'a [AggregationResult],
    function: AggregateFunction,
    field: &str,
) -> Option<&'a AggregationResult> {
    results
        .iter()
        .find(|r| r.function == function && r.field.eq_ignore_ascii_case(field))
}

/// One distinct field value and the results computed over its documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct AggregationBucket {
    value: String,
    results: Vec<AggregationResult>,
}

impl AggregationBucket {
    pub fn new(value: &str) -> Self {
        Self {
            value: value.to_string(),
            results: Vec::new(),
        }
    }

    pub fn add_aggregation_result(
        &mut self,
        function: AggregateFunction,
        field: &str,
        result: f64,
    ) {
        push_unique(
            &mut self.results,
            AggregationResult::new(function, field, result),
        );
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn aggregation_results(&self) -> &[AggregationResult] {
        &self.results
    }

    pub fn aggregation_result(
        &self,
        function: AggregateFunction,
        field: &str,
    ) -> Option<&AggregationResult> {
        find_result(&self.results, function, field)
    }
}

/// Accumulates one aggregation node while a backend response is read.
#[derive(Debug, Clone)]
pub struct AggregateResponseBuilder {
    name: String,
    results: Vec<AggregationResult>,
    buckets: Vec<AggregationBucket>,
    nested: Vec<AggregateResponse>,
    distinct_values_count: i64,
}

impl AggregateResponseBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            results: Vec::new(),
            buckets: Vec::new(),
            nested: Vec::new(),
            distinct_values_count: 0,
        }
    }

    pub fn add_aggregation_result(
        &mut self,
        function: AggregateFunction,
        field: &str,
        result: f64,
    ) -> &mut Self {
        push_unique(
            &mut self.results,
            AggregationResult::new(function, field, result),
        );
        self
    }

    pub fn add_bucket(&mut self, bucket: AggregationBucket) -> &mut Self {
        push_unique(&mut self.buckets, bucket);
        self
    }

    pub fn add_nested_aggregation(&mut self, aggregation: AggregateResponse) -> &mut Self {
        push_unique(&mut self.nested, aggregation);
        self
    }

    pub fn set_distinct_values_count(&mut self, count: i64) -> &mut Self {
        self.distinct_values_count = count;
        self
    }

    /// Fails when the name is blank or the distinct count is negative.
    pub fn create_aggregate_response(&self) -> FilterResult<AggregateResponse> {
        if self.name.trim().is_empty() {
            return Err(FilterError::InvalidArgument(
                "Name cannot be null or empty".to_string(),
            ));
        }
        let distinct_values_count = u64::try_from(self.distinct_values_count).map_err(|_| {
            FilterError::InvalidArgument(format!(
                "Distinct values count cannot be negative: {}",
                self.distinct_values_count
            ))
        })?;

        Ok(AggregateResponse {
            name: self.name.clone(),
            results: self.results.clone(),
            buckets: self.buckets.clone(),
            nested: self.nested.clone(),
            distinct_values_count,
        })
    }
}

/// Frozen aggregation node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateResponse {
    name: String,
    #[serde(rename = "aggregationResults")]
    results: Vec<AggregationResult>,
    buckets: Vec<AggregationBucket>,
    #[serde(rename = "nestedAggregations")]
    nested: Vec<AggregateResponse>,
    distinct_values_count: u64,
}

impl AggregateResponse {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aggregation_results(&self) -> &[AggregationResult] {
        &self.results
    }

    /// First result for `function` whose field matches ignoring case.
    pub fn aggregation_result(
        &self,
        function: AggregateFunction,
        field: &str,
    ) -> Option<&AggregationResult> {
        find_result(&self.results, function, field)
    }

    pub fn buckets(&self) -> &[AggregationBucket] {
        &self.buckets
    }

    pub fn nested_aggregations(&self) -> &[AggregateResponse] {
        &self.nested
    }

    pub fn distinct_values_count(&self) -> u64 {
        self.distinct_values_count
    }

    pub fn has_aggregation_results(&self) -> bool {
        !self.results.is_empty()
    }

    pub fn has_buckets(&self) -> bool {
        !self.buckets.is_empty()
    }

    pub fn has_nested_aggregations(&self) -> bool {
        !self.nested.is_empty()
    }

    pub fn is_populated(&self) -> bool {
        self.has_aggregation_results() || self.has_buckets() || self.has_nested_aggregations()
    }
}
