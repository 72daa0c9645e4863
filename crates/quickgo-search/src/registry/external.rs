//! Filter configs loaded from deployment configuration.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::{FilterConfig, FilterConfigRetrieval, lookup_key};
use crate::error::{FilterError, FilterResult};
use crate::request::signature_of;

/// YAML document shape:
///
/// ```yaml
/// filterConfigs:
///   - signature: goUsageRelationships
///     execution: JOIN
///     properties:
///       fromTable: ontology
///       fromAttribute: id
///       toTable: annotation
///       toAttribute: goId
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterConfigDocument {
    #[serde(default)]
    filter_configs: Vec<FilterConfig>,
}

/// Statically configured filter records.
#[derive(Debug, Clone, Default)]
pub struct ExternalFilterConfigRetrieval {
    configs: HashMap<String, FilterConfig>,
}

impl ExternalFilterConfigRetrieval {
    /// Index `configs` by normalised signature. A repeated signature replaces
    /// the earlier record.
    pub fn new(configs: Vec<FilterConfig>) -> FilterResult<Self> {
        let mut indexed: HashMap<String, FilterConfig> = HashMap::new();

        for mut config in configs {
            let signature = signature_of([config.signature.as_str()]);
            if signature.is_empty() {
                return Err(FilterError::Configuration(
                    "Filter config signature cannot be empty".to_string(),
                ));
            }
            config.signature = signature.clone();

            if indexed.insert(signature.clone(), config).is_some() {
                warn!(
                    signature = %signature,
                    "duplicate external filter config, keeping the last one"
                );
            }
        }

        Ok(Self { configs: indexed })
    }

    pub fn from_yaml_str(yaml: &str) -> FilterResult<Self> {
        let document: FilterConfigDocument = serde_yml::from_str(yaml).map_err(|e| {
            FilterError::Configuration(format!("invalid filter configuration: {e}"))
        })?;
        Self::new(document.filter_configs)
    }

    pub fn from_path(path: &Path) -> FilterResult<Self> {
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            FilterError::Configuration(format!(
                "cannot read filter configuration {}: {e}",
                path.display()
            ))
        })?;
        let retrieval = Self::from_yaml_str(&yaml)?;
        info!(
            path = %path.display(),
            count = retrieval.configs.len(),
            "external filter configs loaded"
        );
        Ok(retrieval)
    }

    pub fn configs(&self) -> impl Iterator<Item = &FilterConfig> {
        self.configs.values()
    }
}

impl FilterConfigRetrieval for ExternalFilterConfigRetrieval {
    fn config_for_signature(&self, signature: &str) -> FilterResult<Option<&FilterConfig>> {
        let key = lookup_key(signature)?;
        Ok(self.configs.get(&key))
    }
}
