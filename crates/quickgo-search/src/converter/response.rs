//! Converters for REST response bodies, registered by name.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use super::ConvertedFilter;
use crate::error::FilterResult;
use crate::ontology::{
    AndDescendantsFilterConverter, DescendantsFilterConverter, SlimmingFilterConverter,
};
use crate::query::QuickGoQuery;
use crate::relevancy::RelevancyResponseConverter;

/// Turns the JSON fetched by a REST_COMM filter into a converted filter.
pub trait ResponseConverter<T>: Send + Sync {
    /// Identifier of the response shape this converter reads; must match the
    /// filter config's `responseClass`.
    fn response_type(&self) -> &str;

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<T>>;
}

/// Response converters keyed by the names used in `responseConverter`.
pub struct ResponseConverterRegistry<T> {
    converters: HashMap<String, Box<dyn ResponseConverter<T>>>,
}

impl<T> Default for ResponseConverterRegistry<T> {
    fn default() -> Self {
        Self {
            converters: HashMap::new(),
        }
    }
}

impl<T> ResponseConverterRegistry<T> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, converter: Box<dyn ResponseConverter<T>>) {
        let replaced = self.converters.insert(name.to_string(), converter);
        if replaced.is_some() {
            warn!(converter = name, "response converter replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<&dyn ResponseConverter<T>> {
        self.converters
            .get(name)
            .map(|converter| converter.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl ResponseConverterRegistry<QuickGoQuery> {
    /// Registry holding the ontology descendant converters.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            DescendantsFilterConverter::NAME,
            Box::new(DescendantsFilterConverter),
        );
        registry.register(
            AndDescendantsFilterConverter::NAME,
            Box::new(AndDescendantsFilterConverter),
        );
        registry.register(
            SlimmingFilterConverter::NAME,
            Box::new(SlimmingFilterConverter),
        );
        registry
    }
}

impl ResponseConverterRegistry<Vec<String>> {
    /// Registry holding the relevancy list converter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(
            RelevancyResponseConverter::NAME,
            Box::new(RelevancyResponseConverter),
        );
        registry
    }
}
