//! Dispatch of filter requests to the converter their config names.

use std::sync::Arc;

use tracing::{debug, warn};

use super::fetch::ResponseFetcher;
use super::join::JoinFilterConverter;
use super::response::ResponseConverterRegistry;
use super::rest::RestFilterConverter;
use super::simple::SimpleFilterConverter;
use super::{ConvertedFilter, FilterConverter, combine};
use crate::error::{FilterError, FilterResult};
use crate::query::QuickGoQuery;
use crate::registry::{ExecutionType, FilterConfig, FilterConfigRetrieval};
use crate::request::FilterRequest;

fn resolve<'a>(
    retrieval: &'a dyn FilterConfigRetrieval,
    request: &FilterRequest,
) -> FilterResult<&'a FilterConfig> {
    retrieval
        .config_for_signature(request.signature())?
        .ok_or_else(|| {
            FilterError::Configuration(format!(
                "No filter configuration for signature: {}",
                request.signature()
            ))
        })
}

/// Converts filter requests into queries.
pub struct FilterConverterFactory {
    retrieval: Arc<dyn FilterConfigRetrieval>,
    fetcher: Arc<dyn ResponseFetcher>,
    converters: Arc<ResponseConverterRegistry<QuickGoQuery>>,
}

impl FilterConverterFactory {
    pub fn new(
        retrieval: Arc<dyn FilterConfigRetrieval>,
        fetcher: Arc<dyn ResponseFetcher>,
    ) -> Self {
        Self {
            retrieval,
            fetcher,
            converters: Arc::new(ResponseConverterRegistry::<QuickGoQuery>::with_defaults()),
        }
    }

    pub fn with_response_converters(
        mut self,
        converters: Arc<ResponseConverterRegistry<QuickGoQuery>>,
    ) -> Self {
        self.converters = converters;
        self
    }

    /// A REST lookup that degrades softly yields a query matching nothing.
    pub async fn convert(
        &self,
        request: &FilterRequest,
    ) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let config = resolve(self.retrieval.as_ref(), request)?;
        debug!(signature = %config.signature, execution = ?config.execution, "converting filter");

        match config.execution {
            ExecutionType::Simple => SimpleFilterConverter::new().transform(request),
            ExecutionType::Join => JoinFilterConverter::new(config)?.transform(request),
            ExecutionType::RestComm => {
                let converter = RestFilterConverter::new(
                    config,
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.converters),
                )?;
                match converter.transform(request).await? {
                    Some(filter) => Ok(filter),
                    None => {
                        warn!(
                            signature = %config.signature,
                            "REST filter unavailable, matching nothing"
                        );
                        Ok(ConvertedFilter::new(QuickGoQuery::filter_everything()))
                    }
                }
            }
        }
    }

    /// Converts each request and ANDs the results.
    pub async fn convert_all(
        &self,
        requests: &[FilterRequest],
    ) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let mut filters = Vec::with_capacity(requests.len());
        for request in requests {
            filters.push(self.convert(request).await?);
        }
        combine(filters)
    }
}

/// Runs REST_COMM filters whose responses are something other than a query,
/// such as the relevancy ordering list.
pub struct RestFilterConverterFactory<T> {
    retrieval: Arc<dyn FilterConfigRetrieval>,
    fetcher: Arc<dyn ResponseFetcher>,
    converters: Arc<ResponseConverterRegistry<T>>,
}

impl<T: Send + 'static> RestFilterConverterFactory<T> {
    pub fn new(
        retrieval: Arc<dyn FilterConfigRetrieval>,
        fetcher: Arc<dyn ResponseFetcher>,
        converters: Arc<ResponseConverterRegistry<T>>,
    ) -> Self {
        Self {
            retrieval,
            fetcher,
            converters,
        }
    }

    /// `Ok(None)` when the lookup degraded; the caller applies its own default.
    pub async fn convert(
        &self,
        request: &FilterRequest,
    ) -> FilterResult<Option<ConvertedFilter<T>>> {
        let config = resolve(self.retrieval.as_ref(), request)?;
        if config.execution != ExecutionType::RestComm {
            return Err(FilterError::IllegalState(format!(
                "Filter '{}' is not a REST filter: {:?}",
                config.signature, config.execution
            )));
        }

        RestFilterConverter::new(
            config,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.converters),
        )?
        .transform(request)
        .await
    }
}
