//! Filter request conversion.
//!
//! This module provides:
//! - SimpleFilterConverter / JoinFilterConverter: synchronous conversions
//! - RestFilterConverter: conversions backed by an outbound REST call
//! - ResponseConverterRegistry: named converters for REST response bodies
//! - FilterConverterFactory: dispatch on a request's execution type

mod extension;
mod factory;
mod fetch;
mod join;
mod response;
mod rest;
mod simple;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::FilterResult;
use crate::query::QuickGoQuery;
use crate::request::FilterRequest;

pub use extension::parse_extension;
pub use factory::{FilterConverterFactory, RestFilterConverterFactory};
pub use fetch::{HttpResponseFetcher, ResponseFetcher};
pub use join::JoinFilterConverter;
pub use response::{ResponseConverter, ResponseConverterRegistry};
pub use rest::{DEFAULT_TIMEOUT_MILLIS, RestFilterConverter, normalise_host};
pub use simple::SimpleFilterConverter;

/// Synchronous request-to-query conversion.
pub trait FilterConverter: Send + Sync {
    fn transform(&self, request: &FilterRequest) -> FilterResult<ConvertedFilter<QuickGoQuery>>;
}

/// A conversion result plus any side information the caller needs later.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedFilter<T> {
    value: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<ConversionContext>,
}

impl<T> ConvertedFilter<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            context: None,
        }
    }

    pub fn with_context(value: T, context: ConversionContext) -> Self {
        Self {
            value,
            context: Some(context),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn context(&self) -> Option<&ConversionContext> {
        self.context.as_ref()
    }

    pub fn into_value(self) -> T {
        self.value
    }

    pub fn into_parts(self) -> (T, Option<ConversionContext>) {
        (self.value, self.context)
    }
}

/// AND the converted filters of several requests, merging their contexts.
pub fn combine(
    filters: impl IntoIterator<Item = ConvertedFilter<QuickGoQuery>>,
) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
    let mut queries = Vec::new();
    let mut context: Option<ConversionContext> = None;

    for filter in filters {
        let (query, filter_context) = filter.into_parts();
        queries.push(query);
        context = match (context, filter_context) {
            (Some(merged), Some(next)) => Some(merged.merge(next)),
            (merged, next) => merged.or(next),
        };
    }

    let query = QuickGoQuery::and(queries)?;
    Ok(match context {
        Some(context) => ConvertedFilter::with_context(query, context),
        None => ConvertedFilter::new(query),
    })
}

/// Typed side information attached to a conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversionInfo {
    Slimming(SlimmingConversionInfo),
}

/// Which requested (slim) ids each matched descendant stands for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SlimmingConversionInfo {
    original_ids: BTreeMap<String, Vec<String>>,
}

impl SlimmingConversionInfo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_original_id(&mut self, descendant: &str, original: &str) {
        let originals = self.original_ids.entry(descendant.to_string()).or_default();
        if !originals.iter().any(|id| id == original) {
            originals.push(original.to_string());
        }
    }

    pub fn original_ids(&self, descendant: &str) -> Option<&[String]> {
        self.original_ids.get(descendant).map(Vec::as_slice)
    }

    pub fn mapping(&self) -> &BTreeMap<String, Vec<String>> {
        &self.original_ids
    }

    fn absorb(&mut self, other: SlimmingConversionInfo) {
        for (descendant, originals) in other.original_ids {
            for original in originals {
                self.add_original_id(&descendant, &original);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversionContext {
    infos: Vec<ConversionInfo>,
}

impl ConversionContext {
    pub fn new(info: ConversionInfo) -> Self {
        Self { infos: vec![info] }
    }

    pub fn infos(&self) -> &[ConversionInfo] {
        &self.infos
    }

    pub fn slimming(&self) -> Option<&SlimmingConversionInfo> {
        self.infos.iter().find_map(|info| match info {
            ConversionInfo::Slimming(slimming) => Some(slimming),
        })
    }

    /// Union of both contexts; infos of the same kind are merged.
    pub fn merge(mut self, other: ConversionContext) -> Self {
        for info in other.infos {
            match info {
                ConversionInfo::Slimming(incoming) => {
                    let existing = self.infos.iter_mut().find_map(|info| match info {
                        ConversionInfo::Slimming(slimming) => Some(slimming),
                    });
                    match existing {
                        Some(existing) => existing.absorb(incoming),
                        None => self.infos.push(ConversionInfo::Slimming(incoming)),
                    }
                }
            }
        }
        self
    }
}
