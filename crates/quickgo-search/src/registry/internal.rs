//! Filter configs derived from the searchable schema fields.

use std::collections::HashMap;

use tracing::debug;

use super::{FilterConfig, FilterConfigRetrieval, SearchableField, lookup_key};
use crate::error::FilterResult;

/// Registers every searchable field as a SIMPLE filter with no properties.
#[derive(Debug, Clone, Default)]
pub struct InternalFilterConfigRetrieval {
    configs: HashMap<String, FilterConfig>,
}

impl InternalFilterConfigRetrieval {
    pub fn new(fields: &dyn SearchableField) -> Self {
        let configs: HashMap<String, FilterConfig> = fields
            .searchable_fields()
            .into_iter()
            .map(FilterConfig::simple)
            .map(|config| (config.signature.clone(), config))
            .collect();

        debug!(count = configs.len(), "internal filter configs registered");
        Self { configs }
    }

    pub fn configs(&self) -> impl Iterator<Item = &FilterConfig> {
        self.configs.values()
    }
}

impl FilterConfigRetrieval for InternalFilterConfigRetrieval {
    fn config_for_signature(&self, signature: &str) -> FilterResult<Option<&FilterConfig>> {
        let key = lookup_key(signature)?;
        Ok(self.configs.get(&key))
    }
}
