//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::registry::{
    ExternalFilterConfigRetrieval, GlobalFilterConfigRetrieval, InternalFilterConfigRetrieval,
    StaticSearchableFields,
};

const DEFAULT_USER_AGENT: &str = concat!("quickgo-search/", env!("CARGO_PKG_VERSION"));

/// Filter conversion configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// YAML file of external filter configs (QUICKGO_FILTER_CONFIG). None means no
    /// external configs.
    pub filter_config: Option<PathBuf>,

    /// Schema fields that convert as SIMPLE filters (comma-separated).
    pub searchable_fields: Vec<String>,

    /// Fields rendered as Solr terms queries (comma-separated).
    pub terms_fields: Vec<String>,

    /// User agent for REST_COMM calls.
    pub rest_user_agent: String,
}

fn comma_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let filter_config = env::var("QUICKGO_FILTER_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        let searchable_fields = env::var("QUICKGO_SEARCHABLE_FIELDS")
            .map(|v| comma_list(&v))
            .unwrap_or_default();

        let terms_fields = env::var("QUICKGO_TERMS_FIELDS")
            .map(|v| comma_list(&v))
            .unwrap_or_default();

        let rest_user_agent =
            env::var("QUICKGO_REST_USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string());

        if let Some(path) = &filter_config {
            anyhow::ensure!(
                path.is_file(),
                "QUICKGO_FILTER_CONFIG does not name a file: {}",
                path.display()
            );
        }

        Ok(Self {
            filter_config,
            searchable_fields,
            terms_fields,
            rest_user_agent,
        })
    }

    /// Builds the merged filter registry: external configs from the YAML file,
    /// overridden by a SIMPLE config per searchable field.
    pub fn filter_registry(&self) -> Result<GlobalFilterConfigRetrieval> {
        let external = match &self.filter_config {
            Some(path) => ExternalFilterConfigRetrieval::from_path(path).with_context(|| {
                format!("failed to load filter configs from {}", path.display())
            })?,
            None => ExternalFilterConfigRetrieval::new(Vec::new())
                .context("failed to create empty external registry")?,
        };
        let searchable = StaticSearchableFields::new(&self.searchable_fields);
        let internal = InternalFilterConfigRetrieval::new(&searchable);
        Ok(GlobalFilterConfigRetrieval::new(&internal, &external))
    }
}
