//! QuickGO search test utilities.
//!
//! Helpers for integration testing: filter config fixtures, stub REST
//! fetchers, and canned ontology service responses.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use quickgo_search::converter::ResponseFetcher;
use quickgo_search::error::FetchError;
use quickgo_search::registry::{
    BACKUP_HOST, ExecutionType, FROM_ATTRIBUTE, FROM_TABLE, FilterConfig, HOST, RESOURCE_FORMAT,
    RESPONSE_CLASS, RESPONSE_CONVERTER, TIMEOUT, TO_ATTRIBUTE, TO_TABLE,
};

/// A JOIN config from `from_table.from_attribute` to `to_table.to_attribute`.
pub fn join_config(
    signature: &str,
    from_table: &str,
    from_attribute: &str,
    to_table: &str,
    to_attribute: &str,
) -> FilterConfig {
    FilterConfig::new(
        signature,
        ExecutionType::Join,
        properties(&[
            (FROM_TABLE, from_table),
            (FROM_ATTRIBUTE, from_attribute),
            (TO_TABLE, to_table),
            (TO_ATTRIBUTE, to_attribute),
        ]),
    )
}

fn properties(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Builder for REST_COMM filter configs.
#[derive(Debug, Clone)]
pub struct RestConfigBuilder {
    signature: String,
    properties: BTreeMap<String, String>,
}

/// A REST_COMM config for the ontology descendants endpoint with the given converter.
pub fn rest_config(signature: &str, converter: &str) -> RestConfigBuilder {
    RestConfigBuilder {
        signature: signature.to_string(),
        properties: properties(&[
            (HOST, "localhost"),
            (RESOURCE_FORMAT, "QuickGO/services/go/terms/{goId}/descendants"),
            (RESPONSE_CLASS, "ontologyRelatives"),
            (RESPONSE_CONVERTER, converter),
        ]),
    }
}

impl RestConfigBuilder {
    pub fn host(self, host: &str) -> Self {
        self.with(HOST, host)
    }

    pub fn backup_host(self, host: &str) -> Self {
        self.with(BACKUP_HOST, host)
    }

    pub fn resource_format(self, format: &str) -> Self {
        self.with(RESOURCE_FORMAT, format)
    }

    pub fn response_class(self, class: &str) -> Self {
        self.with(RESPONSE_CLASS, class)
    }

    pub fn timeout_millis(self, millis: u64) -> Self {
        self.with(TIMEOUT, &millis.to_string())
    }

    /// Set any property.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.properties.insert(key.to_string(), value.to_string());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.properties.remove(key);
        self
    }

    pub fn build(self) -> FilterConfig {
        FilterConfig::new(&self.signature, ExecutionType::RestComm, self.properties)
    }
}

/// An ontology relatives response: one result per `(id, descendants)` pair.
/// `None` descendants leaves the field out.
pub fn ontology_relatives(results: &[(&str, Option<&[&str]>)]) -> Value {
    let results: Vec<Value> = results
        .iter()
        .map(|(id, descendants)| match descendants {
            Some(descendants) => json!({"id": id, "descendants": descendants}),
            None => json!({"id": id}),
        })
        .collect();
    json!({ "numberOfHits": results.len(), "results": results })
}

/// How a [`StubFetcher`] answers.
#[derive(Debug)]
pub enum StubResponse {
    Body(Value),
    Retrieval(String),
    Unexpected(String),
    /// Sleep before answering with the body, to trip timeouts.
    Delayed(Duration, Value),
}

/// A [`ResponseFetcher`] that answers by URL prefix and records every URL it saw.
#[derive(Debug, Default)]
pub struct StubFetcher {
    routes: Vec<(String, StubResponse)>,
    calls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every URL with `response`.
    pub fn always(response: StubResponse) -> Self {
        Self::new().route("", response)
    }

    /// Answer URLs starting with `prefix`; the first matching route wins.
    pub fn route(mut self, prefix: &str, response: StubResponse) -> Self {
        self.routes.push((prefix.to_string(), response));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }

    fn response_for(&self, url: &str) -> Option<&StubResponse> {
        self.routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix))
            .map(|(_, response)| response)
    }
}

#[async_trait]
impl ResponseFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }

        let Some(response) = self.response_for(url) else {
            return Err(FetchError::Retrieval(format!("no stub route for {url}")));
        };

        match response {
            StubResponse::Body(body) => Ok(body.clone()),
            StubResponse::Retrieval(message) => Err(FetchError::Retrieval(message.clone())),
            StubResponse::Unexpected(message) => {
                Err(FetchError::Unexpected(anyhow::anyhow!("{message}")))
            }
            StubResponse::Delayed(delay, body) => {
                tokio::time::sleep(*delay).await;
                Ok(body.clone())
            }
        }
    }
}
