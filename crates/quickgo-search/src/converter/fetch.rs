//! Outbound REST calls used by REST_COMM filters.

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::error::FetchError;

/// Fetches a JSON document from a fully expanded URL.
#[async_trait]
pub trait ResponseFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError>;
}

/// [`ResponseFetcher`] over a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct HttpResponseFetcher {
    client: reqwest::Client,
}

impl HttpResponseFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn with_user_agent(user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Unexpected(anyhow::Error::new(e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ResponseFetcher for HttpResponseFetcher {
    /// Transport errors, non-2xx statuses and undecodable bodies are all
    /// retrieval failures. A URL the client cannot build a request from is
    /// an illegal state.
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    FetchError::IllegalState(format!("cannot build request for {url}: {e}"))
                } else {
                    FetchError::Retrieval(format!("{url}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Retrieval(format!("{url} returned {status}")));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Retrieval(format!("invalid JSON from {url}: {e}")))?;

        debug!(url = %url, "REST response received");
        Ok(body)
    }
}
