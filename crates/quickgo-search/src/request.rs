//! Client filter requests.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{FilterError, FilterResult};

const SIGNATURE_SEPARATOR: &str = ",";

/// One client filter: property names mapped to their values.
///
/// The signature is derived from the property names and is the key used to
/// find the request's [`FilterConfig`](crate::registry::FilterConfig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterRequest {
    signature: String,
    properties: BTreeMap<String, Vec<String>>,
}

impl FilterRequest {
    pub fn builder() -> FilterRequestBuilder {
        FilterRequestBuilder::default()
    }

    /// Shorthand for a single-property request.
    pub fn single<I, S>(name: &str, values: I) -> FilterResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().add_property(name, values).build()
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn properties(&self) -> &BTreeMap<String, Vec<String>> {
        &self.properties
    }

    pub fn values(&self, name: &str) -> Option<&[String]> {
        self.properties.get(name).map(Vec::as_slice)
    }

    /// True when at least one property carries values.
    pub fn has_values(&self) -> bool {
        self.properties.values().any(|values| !values.is_empty())
    }
}

/// Accumulates properties; validation happens in [`FilterRequestBuilder::build`].
#[derive(Debug, Default)]
pub struct FilterRequestBuilder {
    properties: BTreeMap<String, Vec<String>>,
}

impl FilterRequestBuilder {
    /// Add `values` under `name`, appending when the name was already added.
    ///
    /// An empty `values` is allowed and records the name only.
    pub fn add_property<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .entry(name.to_string())
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> FilterResult<FilterRequest> {
        if self.properties.is_empty() {
            return Err(FilterError::InvalidArgument(
                "A filter request needs at least one property".to_string(),
            ));
        }

        for (name, values) in &self.properties {
            if name.trim().is_empty() {
                return Err(FilterError::InvalidArgument(
                    "Property name cannot be null or empty".to_string(),
                ));
            }
            if values.iter().any(|value| value.trim().is_empty()) {
                return Err(FilterError::InvalidArgument(format!(
                    "Values of property '{name}' cannot be null or empty"
                )));
            }
        }

        Ok(FilterRequest {
            signature: signature_of(self.properties.keys()),
            properties: self.properties,
        })
    }
}

/// Sorted, de-duplicated, comma-joined names.
///
/// Each name is trimmed first so configured signatures such as `"b, a"`
/// resolve the same way as request-derived ones.
pub fn signature_of<I, S>(names: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<String> = names
        .into_iter()
        .flat_map(|name| {
            name.as_ref()
                .split(SIGNATURE_SEPARATOR)
                .map(|part| part.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|name| !name.is_empty())
        .collect();
    names.sort();
    names.dedup();
    names.join(SIGNATURE_SEPARATOR)
}
