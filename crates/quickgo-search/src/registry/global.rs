//! The registry consulted by converters: internal and external configs merged.

use std::collections::HashMap;

use tracing::{info, warn};

use super::{
    ExternalFilterConfigRetrieval, FilterConfig, FilterConfigRetrieval,
    InternalFilterConfigRetrieval, lookup_key,
};
use crate::error::FilterResult;

/// Built once at startup and read-only afterwards, so it can be shared
/// behind an `Arc` across concurrent requests without locking.
#[derive(Debug, Clone, Default)]
pub struct GlobalFilterConfigRetrieval {
    configs: HashMap<String, FilterConfig>,
}

impl GlobalFilterConfigRetrieval {
    /// Merge both sources. On a signature present in both, the internal
    /// config is kept and a warning is logged.
    pub fn new(
        internal: &InternalFilterConfigRetrieval,
        external: &ExternalFilterConfigRetrieval,
    ) -> Self {
        let mut configs: HashMap<String, FilterConfig> = external
            .configs()
            .map(|config| (config.signature.clone(), config.clone()))
            .collect();

        for config in internal.configs() {
            if let Some(shadowed) = configs.insert(config.signature.clone(), config.clone()) {
                warn!(
                    signature = %config.signature,
                    external_execution = ?shadowed.execution,
                    "external filter config overridden by internal searchable field"
                );
            }
        }

        info!(count = configs.len(), "filter config registry built");
        Self { configs }
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}

impl FilterConfigRetrieval for GlobalFilterConfigRetrieval {
    fn config_for_signature(&self, signature: &str) -> FilterResult<Option<&FilterConfig>> {
        let key = lookup_key(signature)?;
        Ok(self.configs.get(&key))
    }
}
