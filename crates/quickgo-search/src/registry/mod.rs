//! Filter configuration registry.
//!
//! Maps a request signature to the strategy used to convert it:
//! - InternalFilterConfigRetrieval: every searchable schema field, always SIMPLE
//! - ExternalFilterConfigRetrieval: records loaded from YAML deployment config
//! - GlobalFilterConfigRetrieval: both merged once, internal taking precedence

mod external;
mod global;
mod internal;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{FilterError, FilterResult};
use crate::request::signature_of;

pub use external::ExternalFilterConfigRetrieval;
pub use global::GlobalFilterConfigRetrieval;
pub use internal::InternalFilterConfigRetrieval;

// Join properties.
pub const FROM_TABLE: &str = "fromTable";
pub const FROM_ATTRIBUTE: &str = "fromAttribute";
pub const TO_TABLE: &str = "toTable";
pub const TO_ATTRIBUTE: &str = "toAttribute";

// REST properties.
pub const HOST: &str = "ip";
pub const BACKUP_HOST: &str = "backupIp";
pub const RESOURCE_FORMAT: &str = "resourceFormat";
pub const BODY_PATH: &str = "responseBodyPath";
pub const TIMEOUT: &str = "timeout";
pub const RESPONSE_CLASS: &str = "responseClass";
pub const RESPONSE_CONVERTER: &str = "responseConverter";

/// How a filter request is turned into a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionType {
    /// Field/value leaves combined with OR within a field and AND across fields.
    Simple,
    /// Cross-collection join wrapping a simple filter.
    Join,
    /// Resolved by calling an external REST service.
    RestComm,
}

impl ExecutionType {
    pub fn required_properties(self) -> &'static [&'static str] {
        match self {
            ExecutionType::Simple => &[],
            ExecutionType::Join => &[FROM_TABLE, FROM_ATTRIBUTE, TO_TABLE, TO_ATTRIBUTE],
            ExecutionType::RestComm => &[HOST, RESOURCE_FORMAT, RESPONSE_CLASS, RESPONSE_CONVERTER],
        }
    }

    /// Fails with a configuration error naming the first missing property.
    pub fn validate(self, properties: &BTreeMap<String, String>) -> FilterResult<()> {
        for key in self.required_properties() {
            let present = properties
                .get(*key)
                .is_some_and(|value| !value.trim().is_empty());
            if !present {
                return Err(FilterError::Configuration(format!(
                    "FilterConfig must have mandatory field: {key}"
                )));
            }
        }
        Ok(())
    }
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub signature: String,
    pub execution: ExecutionType,
    #[serde(default, deserialize_with = "scalar_properties")]
    pub properties: BTreeMap<String, String>,
}

/// Property values as written in YAML; numbers and booleans are kept as text.
#[derive(Deserialize)]
#[serde(untagged)]
enum PropertyValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

impl PropertyValue {
    fn into_string(self) -> String {
        match self {
            PropertyValue::String(s) => s,
            PropertyValue::Integer(i) => i.to_string(),
            PropertyValue::Float(f) => f.to_string(),
            PropertyValue::Boolean(b) => b.to_string(),
        }
    }
}

fn scalar_properties<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: Option<BTreeMap<String, PropertyValue>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.into_string()))
        .collect())
}

impl FilterConfig {
    pub fn new(
        signature: &str,
        execution: ExecutionType,
        properties: BTreeMap<String, String>,
    ) -> Self {
        Self {
            signature: signature_of([signature]),
            execution,
            properties,
        }
    }

    pub fn simple(signature: &str) -> Self {
        Self::new(signature, ExecutionType::Simple, BTreeMap::new())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Schema capability: which fields the backend can search on.
pub trait SearchableField: Send + Sync {
    fn is_searchable(&self, field: &str) -> bool;

    fn searchable_fields(&self) -> Vec<&str>;
}

/// A fixed list of searchable fields.
#[derive(Debug, Clone, Default)]
pub struct StaticSearchableFields {
    fields: Vec<String>,
}

impl StaticSearchableFields {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for field in fields {
            let field = field.into();
            if !field.trim().is_empty() && !list.contains(&field) {
                list.push(field);
            }
        }
        Self { fields: list }
    }
}

impl SearchableField for StaticSearchableFields {
    fn is_searchable(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    fn searchable_fields(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

/// Lookup of filter configs by signature.
pub trait FilterConfigRetrieval: Send + Sync {
    /// `Ok(None)` for an unknown signature; a blank one is an invalid argument.
    fn config_for_signature(&self, signature: &str) -> FilterResult<Option<&FilterConfig>>;
}

/// Validates and normalises a lookup key.
pub(crate) fn lookup_key(signature: &str) -> FilterResult<String> {
    let key = signature_of([signature]);
    if key.is_empty() {
        return Err(FilterError::InvalidArgument(
            "Signature cannot be null or empty".to_string(),
        ));
    }
    Ok(key)
}
