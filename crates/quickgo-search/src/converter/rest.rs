//! REST_COMM conversion: the filter is resolved by an external service.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::{Host, Url};

use super::ConvertedFilter;
use super::fetch::ResponseFetcher;
use super::response::ResponseConverterRegistry;
use crate::error::{FetchError, FilterError, FilterResult};
use crate::registry::{
    BACKUP_HOST, BODY_PATH, ExecutionType, FilterConfig, HOST, RESOURCE_FORMAT, RESPONSE_CLASS,
    RESPONSE_CONVERTER, TIMEOUT,
};
use crate::request::FilterRequest;

pub const DEFAULT_TIMEOUT_MILLIS: u64 = 2000;

const HTTP_PREFIX: &str = "http://";
const HTTPS_PREFIX: &str = "https://";
const VALUE_SEPARATOR: &str = ",";

/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").expect("valid regex literal"));

/// Resolves a filter by calling a REST service and converting its response
/// with a named [`ResponseConverter`](super::ResponseConverter).
///
/// Expected failures (unreachable host, bad status, timeout, unusable
/// response) are logged and reported as `Ok(None)` so callers can fall back
/// to their own defaults. Anything else is returned as an error.
pub struct RestFilterConverter<T> {
    resource_template: String,
    backup_template: Option<String>,
    body_path: Option<String>,
    timeout: Duration,
    response_class: String,
    converter_name: String,
    converters: Arc<ResponseConverterRegistry<T>>,
    fetcher: Arc<dyn ResponseFetcher>,
}

impl<T: Send + 'static> RestFilterConverter<T> {
    /// Validates the REST properties; a missing mandatory one or a bad host
    /// fails here rather than on first use.
    pub fn new(
        config: &FilterConfig,
        fetcher: Arc<dyn ResponseFetcher>,
        converters: Arc<ResponseConverterRegistry<T>>,
    ) -> FilterResult<Self> {
        ExecutionType::RestComm.validate(&config.properties)?;

        let resource = resource_path(config.property(RESOURCE_FORMAT).unwrap_or_default());
        let host = normalise_host(config.property(HOST).unwrap_or_default())?;
        let backup_template = match config.property(BACKUP_HOST).map(str::trim) {
            Some(backup) if !backup.is_empty() => Some(normalise_host(backup)? + &resource),
            _ => None,
        };

        let timeout = match config.property(TIMEOUT) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                FilterError::InvalidArgument(format!(
                    "FilterConfig's '{TIMEOUT}' property must be a number: {raw}"
                ))
            })?,
            None => {
                debug!(
                    signature = %config.signature,
                    timeout_ms = DEFAULT_TIMEOUT_MILLIS,
                    "no timeout configured, using default"
                );
                DEFAULT_TIMEOUT_MILLIS
            }
        };

        Ok(Self {
            resource_template: host + &resource,
            backup_template,
            body_path: config
                .property(BODY_PATH)
                .map(str::trim)
                .filter(|path| !path.is_empty())
                .map(str::to_string),
            timeout: Duration::from_millis(timeout),
            response_class: config
                .property(RESPONSE_CLASS)
                .unwrap_or_default()
                .to_string(),
            converter_name: config
                .property(RESPONSE_CONVERTER)
                .unwrap_or_default()
                .to_string(),
            converters,
            fetcher,
        })
    }

    pub fn resource_template(&self) -> &str {
        &self.resource_template
    }

    pub fn backup_template(&self) -> Option<&str> {
        self.backup_template.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn transform(
        &self,
        request: &FilterRequest,
    ) -> FilterResult<Option<ConvertedFilter<T>>> {
        let parameters = request_parameters(request);
        let url = expand_template(&self.resource_template, &parameters)?;
        let backup = self
            .backup_template
            .as_deref()
            .map(|template| expand_template(template, &parameters))
            .transpose()?;

        let body = match self.fetch_with_fallback(&url, backup.as_deref()).await {
            Ok(body) => body,
            Err(FetchError::Unexpected(e)) => return Err(FilterError::Unexpected(e)),
            Err(e) => {
                error!(url = %url, error = %e, "REST filter lookup failed");
                return Ok(None);
            }
        };

        match self.convert(extract_body(body, self.body_path.as_deref())) {
            Ok(filter) => Ok(Some(filter)),
            Err(e) if e.is_soft() => {
                error!(
                    url = %url,
                    converter = %self.converter_name,
                    error = %e,
                    "REST filter response could not be converted"
                );
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn fetch_with_fallback(
        &self,
        url: &str,
        backup: Option<&str>,
    ) -> Result<Value, FetchError> {
        match self.fetch_once(url).await {
            Err(e) if e.is_soft() => match backup {
                Some(backup) => {
                    warn!(
                        url = %url,
                        backup = %backup,
                        error = %e,
                        "primary REST host failed, trying backup"
                    );
                    self.fetch_once(backup).await
                }
                None => Err(e),
            },
            result => result,
        }
    }

    async fn fetch_once(&self, url: &str) -> Result<Value, FetchError> {
        match tokio::time::timeout(self.timeout, self.fetcher.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<T>> {
        let converter = self.converters.get(&self.converter_name).ok_or_else(|| {
            FilterError::IllegalState(format!(
                "Unknown REST response converter: {}",
                self.converter_name
            ))
        })?;

        if converter.response_type() != self.response_class {
            return Err(FilterError::IllegalState(format!(
                "Response converter '{}' reads '{}' but the filter expects '{}'",
                self.converter_name,
                converter.response_type(),
                self.response_class
            )));
        }

        converter.convert(response)
    }
}

/// Adds `http://` when no scheme is given and drops a trailing slash.
///
/// The result must parse as a URL whose host is a DNS name or an IP address,
/// optionally with a port, and nothing else: no path, query, fragment or
/// credentials.
pub fn normalise_host(raw: &str) -> FilterResult<String> {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
    let host = if trimmed.starts_with(HTTP_PREFIX) || trimmed.starts_with(HTTPS_PREFIX) {
        trimmed.to_string()
    } else {
        format!("{HTTP_PREFIX}{trimmed}")
    };

    let parsed = Url::parse(&host).map_err(|_| invalid_host(&host))?;
    let valid_host = match parsed.host() {
        Some(Host::Domain(domain)) => domain.split('.').all(is_host_label),
        Some(Host::Ipv4(_) | Host::Ipv6(_)) => true,
        None => false,
    };
    if !valid_host
        || parsed.path() != "/"
        || parsed.query().is_some()
        || parsed.fragment().is_some()
        || !parsed.username().is_empty()
        || parsed.password().is_some()
    {
        return Err(invalid_host(&host));
    }
    Ok(host)
}

fn invalid_host(host: &str) -> FilterError {
    error!(host = %host, "invalid REST host name");
    FilterError::InvalidHostName(format!("Invalid host name specified: {host}"))
}

fn is_host_label(label: &str) -> bool {
    !label.is_empty()
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

fn resource_path(format: &str) -> String {
    let format = format.trim();
    if format.starts_with('/') {
        format.to_string()
    } else {
        format!("/{format}")
    }
}

/// Each property's values joined with commas, keyed by property name.
fn request_parameters(request: &FilterRequest) -> BTreeMap<&str, String> {
    request
        .properties()
        .iter()
        .map(|(name, values)| (name.as_str(), values.join(VALUE_SEPARATOR)))
        .collect()
}

/// Substitutes `{name}` placeholders with URL-encoded parameter values.
fn expand_template(template: &str, parameters: &BTreeMap<&str, String>) -> FilterResult<String> {
    if let Some(missing) = PLACEHOLDER
        .captures_iter(template)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .find(|name| !parameters.contains_key(name))
    {
        return Err(FilterError::InvalidArgument(format!(
            "No value supplied for REST template variable '{missing}'"
        )));
    }

    let expanded = PLACEHOLDER.replace_all(template, |caps: &Captures<'_>| {
        let name = caps.get(1).map_or("", |m| m.as_str());
        parameters
            .get(name)
            .map(|value| urlencoding::encode(value).into_owned())
            .unwrap_or_default()
    });
    Ok(expanded.into_owned())
}

/// Walks a dotted path (`results.ids`, optionally prefixed with `$.`)
/// through the body. Arrays met along the way are mapped element-wise;
/// a missing key yields `Null`.
fn extract_body(body: Value, path: Option<&str>) -> Value {
    let Some(path) = path else {
        return body;
    };

    path.split('.')
        .filter(|segment| !segment.is_empty() && *segment != "$")
        .fold(body, |current, segment| select(current, segment))
}

fn select(value: Value, key: &str) -> Value {
    match value {
        Value::Object(mut map) => map.remove(key).unwrap_or(Value::Null),
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| select(item, key))
                .filter(|item| !item.is_null())
                .collect(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use async_trait::async_trait;
    use serde_json::json;

    use super::*;
    use crate::converter::ResponseConverter;

    struct NoFetch;

    #[async_trait]
    impl ResponseFetcher for NoFetch {
        async fn fetch(&self, _url: &str) -> Result<Value, FetchError> {
            Err(FetchError::Retrieval("offline".to_string()))
        }
    }

    struct Echo;

    impl ResponseConverter<Value> for Echo {
        fn response_type(&self) -> &str {
            "json"
        }

        fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<Value>> {
            Ok(ConvertedFilter::new(response))
        }
    }

    fn config(pairs: &[(&str, &str)]) -> FilterConfig {
        FilterConfig::new(
            "goId",
            ExecutionType::RestComm,
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![
            (HOST, "localhost:8082"),
            (RESOURCE_FORMAT, "QuickGO/services/go/terms/{goId}/descendants"),
            (RESPONSE_CLASS, "json"),
            (RESPONSE_CONVERTER, "echo"),
        ]
    }

    fn build(pairs: &[(&str, &str)]) -> FilterResult<RestFilterConverter<Value>> {
        let mut registry = ResponseConverterRegistry::new();
        registry.register("echo", Box::new(Echo));
        RestFilterConverter::new(&config(pairs), Arc::new(NoFetch), Arc::new(registry))
    }

    #[test]
    fn host_gets_scheme_and_loses_trailing_slash() {
        assert_eq!(
            normalise_host("localhost:8082/").unwrap(),
            "http://localhost:8082"
        );
        assert_eq!(
            normalise_host(" www.ebi.ac.uk ").unwrap(),
            "http://www.ebi.ac.uk"
        );
        assert_eq!(
            normalise_host("https://www.ebi.ac.uk").unwrap(),
            "https://www.ebi.ac.uk"
        );
        assert_eq!(
            normalise_host("127.0.0.1:9000").unwrap(),
            "http://127.0.0.1:9000"
        );
        assert_eq!(normalise_host("[::1]:8080").unwrap(), "http://[::1]:8080");
    }

    #[test]
    fn invalid_hosts_are_rejected() {
        let hosts = [
            "host?:8082",
            "host&",
            "-host",
            "host..ebi",
            "",
            "not a host",
            "www.ebi.ac.uk/QuickGO",
            "user@www.ebi.ac.uk",
            "www.ebi.ac.uk#top",
        ];
        for host in hosts {
            assert!(
                matches!(normalise_host(host), Err(FilterError::InvalidHostName(_))),
                "{host} should be rejected"
            );
        }
    }

    #[test]
    fn resource_template_joins_host_and_path() {
        let converter = build(&base()).unwrap();
        assert_eq!(
            converter.resource_template(),
            "http://localhost:8082/QuickGO/services/go/terms/{goId}/descendants"
        );
        assert!(converter.backup_template().is_none());
        assert_eq!(
            converter.timeout(),
            Duration::from_millis(DEFAULT_TIMEOUT_MILLIS)
        );
    }

    #[test]
    fn backup_template_uses_the_same_resource() {
        let mut pairs = base();
        pairs.push((BACKUP_HOST, "backup.ebi.ac.uk"));
        let converter = build(&pairs).unwrap();
        assert_eq!(
            converter.backup_template(),
            Some("http://backup.ebi.ac.uk/QuickGO/services/go/terms/{goId}/descendants")
        );

        let mut blank = base();
        blank.push((BACKUP_HOST, " "));
        assert!(build(&blank).unwrap().backup_template().is_none());
    }

    #[test]
    fn timeout_must_be_numeric() {
        let mut pairs = base();
        pairs.push((TIMEOUT, "soon"));
        assert!(matches!(build(&pairs), Err(FilterError::InvalidArgument(_))));

        let mut pairs = base();
        pairs.push((TIMEOUT, "150"));
        let converter = build(&pairs).unwrap();
        assert_eq!(converter.timeout(), Duration::from_millis(150));
    }

    #[test]
    fn mandatory_properties() {
        for key in [HOST, RESOURCE_FORMAT, RESPONSE_CLASS, RESPONSE_CONVERTER] {
            let pairs: Vec<_> = base().into_iter().filter(|(k, _)| *k != key).collect();
            assert!(matches!(build(&pairs), Err(FilterError::Configuration(_))));
        }
    }

    #[test]
    fn template_expansion_encodes_joined_values() {
        let request = FilterRequest::single("goId", ["GO:0000001", "GO:0000002"]).unwrap();
        let parameters = request_parameters(&request);
        assert_eq!(
            expand_template("http://h/terms/{goId}/descendants", &parameters).unwrap(),
            "http://h/terms/GO%3A0000001%2CGO%3A0000002/descendants"
        );
        assert!(matches!(
            expand_template("http://h/terms/{other}", &parameters),
            Err(FilterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn body_path_extraction() {
        let body = json!({
            "results": [{"id": "a"}, {"id": "b"}, {"name": "c"}],
            "numberOfHits": 3
        });
        assert_eq!(extract_body(body.clone(), None), body);
        assert_eq!(extract_body(body.clone(), Some("numberOfHits")), json!(3));
        assert_eq!(
            extract_body(body.clone(), Some("$.results.id")),
            json!(["a", "b"])
        );
        assert_eq!(extract_body(body, Some("missing.key")), Value::Null);
    }

    #[tokio::test]
    async fn retrieval_failure_is_soft() {
        let converter = build(&base()).unwrap();
        let request = FilterRequest::single("goId", ["GO:0000001"]).unwrap();
        assert!(converter.transform(&request).await.unwrap().is_none());
    }
}
