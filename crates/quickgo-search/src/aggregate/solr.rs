//! Reads the `facets` section of a Solr JSON response into an
//! [`AggregateResponse`] tree.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::debug;

use super::request::{AGG_NAME_SEPARATOR, AGG_TYPE_PREFIX};
use super::{AggregateFunction, AggregateResponse, AggregateResponseBuilder, AggregationBucket};
use crate::error::{FilterError, FilterResult};

/// Name of the root aggregation.
pub const GLOBAL_ID: &str = "global";
pub const AGGREGATIONS_MARKER: &str = "facets";
pub const NUM_BUCKETS: &str = "numBuckets";
pub const BUCKETS_ID: &str = "buckets";
pub const BUCKET_FIELD_ID: &str = "val";

/// `("count", "geneProductId")` for `count_geneProductId`; no prefix when
/// there is no separator.
fn split_prefix(key: &str) -> (&str, &str) {
    key.split_once(AGG_NAME_SEPARATOR).unwrap_or(("", key))
}

fn to_f64(key: &str, value: &Value) -> FilterResult<f64> {
    value.as_f64().ok_or_else(|| {
        FilterError::InvalidArgument(format!("Unable to convert number for {key}: {value}"))
    })
}

pub struct SolrResponseAggregationConverter {
    field_names: HashMap<String, String>,
}

impl SolrResponseAggregationConverter {
    /// `field_names` maps repository field names to the names exposed to
    /// clients; unmapped names pass through.
    pub fn new(field_names: HashMap<String, String>) -> Self {
        Self { field_names }
    }

    pub fn convert(&self, response: &Value) -> FilterResult<AggregateResponse> {
        let mut global = AggregateResponseBuilder::new(GLOBAL_ID);
        if let Some(facets) = response.get(AGGREGATIONS_MARKER).and_then(Value::as_object) {
            self.read_aggregation(facets, &mut global)?;
        }
        global.create_aggregate_response()
    }

    fn read_aggregation(
        &self,
        facets: &Map<String, Value>,
        builder: &mut AggregateResponseBuilder,
    ) -> FilterResult<()> {
        for (key, value) in facets {
            match split_prefix(key) {
                (AGG_TYPE_PREFIX, name) => {
                    let mut nested = AggregateResponseBuilder::new(self.domain_name(name));
                    if let Some(nested_facets) = value.as_object() {
                        self.read_aggregation(nested_facets, &mut nested)?;
                    }
                    builder.add_nested_aggregation(nested.create_aggregate_response()?);
                }
                ("", NUM_BUCKETS) => {
                    let count = value.as_i64().ok_or_else(|| {
                        FilterError::InvalidArgument(format!(
                            "{NUM_BUCKETS} is not an integer: {value}"
                        ))
                    })?;
                    builder.set_distinct_values_count(count);
                }
                ("", BUCKETS_ID) => {
                    for bucket in value.as_array().into_iter().flatten() {
                        if let Some(bucket) = bucket.as_object() {
                            builder.add_bucket(read_bucket(bucket)?);
                        }
                    }
                }
                (prefix, field) => match prefix.parse::<AggregateFunction>() {
                    Ok(function) if !prefix.is_empty() => {
                        builder.add_aggregation_result(function, field, to_f64(key, value)?);
                    }
                    _ => debug!(field = %key, "skipping unrecognised facet entry"),
                },
            }
        }
        Ok(())
    }

    fn domain_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.field_names.get(name).map_or(name, String::as_str)
    }
}

fn read_bucket(entries: &Map<String, Value>) -> FilterResult<AggregationBucket> {
    let value = match entries.get(BUCKET_FIELD_ID) {
        Some(Value::String(value)) => value.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    };
    let mut bucket = AggregationBucket::new(&value);

    for (key, entry) in entries {
        match split_prefix(key) {
            ("", _) => debug!(field = %key, "skipping bucket entry"),
            (prefix, field) => {
                let function = prefix.parse::<AggregateFunction>()?;
                bucket.add_aggregation_result(function, field, to_f64(key, entry)?);
            }
        }
    }
    Ok(bucket)
}
