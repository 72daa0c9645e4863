//! Aggregation model.
//!
//! This module provides:
//! - AggregateRequest: what to aggregate, rendered as a Solr facet declaration
//! - AggregateResponseBuilder / AggregateResponse: the result tree
//! - SolrResponseAggregationConverter: reads Solr facet output into that tree

mod function;
mod request;
mod response;
pub mod solr;

pub use function::AggregateFunction;
pub use request::{
    AGG_NAME_SEPARATOR, AGG_TYPE_PREFIX, AggregateField, AggregateRequest, FACET_TYPE_TERMS,
    aggregate_field_title, aggregate_type_title,
};
pub use response::{
    AggregateResponse, AggregateResponseBuilder, AggregationBucket, AggregationResult,
};
pub use solr::SolrResponseAggregationConverter;
