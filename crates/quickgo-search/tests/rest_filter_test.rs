//! Integration tests for REST_COMM filters.
//!
//! Stubbed fetchers cover the soft-failure rules; a mockito server covers the
//! HTTP fetcher and one full round trip.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use mockito::{Matcher, Server};
use serde_json::json;

use quickgo_search::converter::{
    FilterConverterFactory, HttpResponseFetcher, ResponseConverterRegistry, ResponseFetcher,
    RestFilterConverter, RestFilterConverterFactory,
};
use quickgo_search::error::{FetchError, FilterError};
use quickgo_search::fields::GO_ID;
use quickgo_search::registry::{ExternalFilterConfigRetrieval, RESPONSE_CONVERTER};
use quickgo_search::{FilterRequest, QuickGoQuery};
use quickgo_test_utils::{StubFetcher, StubResponse, ontology_relatives, rest_config};

fn go_request(ids: &[&str]) -> FilterRequest {
    FilterRequest::single(GO_ID, ids.iter().copied()).unwrap()
}

fn query_converters() -> Arc<ResponseConverterRegistry<QuickGoQuery>> {
    Arc::new(ResponseConverterRegistry::<QuickGoQuery>::with_defaults())
}

fn descendants_body() -> serde_json::Value {
    ontology_relatives(&[("GO:0000001", Some(&["GO:0000002", "GO:0000003"]))])
}

// ---------------------------------------------------------------------------
// Soft and hard failures
// ---------------------------------------------------------------------------

/// A retrieval failure from the collaborator degrades to an empty result.
#[tokio::test]
async fn retrieval_failure_gives_no_result() {
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants").build(),
        Arc::new(StubFetcher::always(StubResponse::Retrieval("503".to_string()))),
        query_converters(),
    )
    .unwrap();

    let result = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert!(result.is_none());
}

/// Any other failure from the collaborator propagates unchanged.
#[tokio::test]
async fn unexpected_failure_propagates() {
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants").build(),
        Arc::new(StubFetcher::always(StubResponse::Unexpected(
            "connection pool poisoned".to_string(),
        ))),
        query_converters(),
    )
    .unwrap();

    let err = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap_err();
    assert!(matches!(err, FilterError::Unexpected(_)));
    assert_eq!(err.to_string(), "connection pool poisoned");
}

#[tokio::test]
async fn slow_service_times_out_softly() {
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants").timeout_millis(20).build(),
        Arc::new(StubFetcher::always(StubResponse::Delayed(
            Duration::from_millis(500),
            descendants_body(),
        ))),
        query_converters(),
    )
    .unwrap();

    let result = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn backup_host_is_tried_after_a_retrieval_failure() {
    let fetcher = Arc::new(
        StubFetcher::new()
            .route(
                "http://primary.ebi.ac.uk",
                StubResponse::Retrieval("down".to_string()),
            )
            .route(
                "http://backup.ebi.ac.uk",
                StubResponse::Body(descendants_body()),
            ),
    );
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants")
            .host("primary.ebi.ac.uk")
            .backup_host("backup.ebi.ac.uk")
            .build(),
        fetcher.clone(),
        query_converters(),
    )
    .unwrap();

    let converted = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        converted.into_value(),
        QuickGoQuery::or([
            QuickGoQuery::create_query(GO_ID, "GO:0000002").unwrap(),
            QuickGoQuery::create_query(GO_ID, "GO:0000003").unwrap(),
        ])
        .unwrap()
    );
    assert_eq!(
        fetcher.calls(),
        [
            "http://primary.ebi.ac.uk/QuickGO/services/go/terms/GO%3A0000001/descendants",
            "http://backup.ebi.ac.uk/QuickGO/services/go/terms/GO%3A0000001/descendants",
        ]
    );
}

#[tokio::test]
async fn mismatched_response_class_gives_no_result() {
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants")
            .response_class("stringList")
            .build(),
        Arc::new(StubFetcher::always(StubResponse::Body(descendants_body()))),
        query_converters(),
    )
    .unwrap();

    let result = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn unknown_converter_gives_no_result() {
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "ancestors").build(),
        Arc::new(StubFetcher::always(StubResponse::Body(descendants_body()))),
        query_converters(),
    )
    .unwrap();

    let result = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert!(result.is_none());
}

/// A term without descendants is a retrieval failure inside the converter.
#[tokio::test]
async fn missing_descendants_give_no_result() {
    let body = ontology_relatives(&[("GO:0000001", None)]);
    let converter = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants").build(),
        Arc::new(StubFetcher::always(StubResponse::Body(body))),
        query_converters(),
    )
    .unwrap();

    let result = converter
        .transform(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert!(result.is_none());
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn missing_converter_property_is_a_configuration_error() {
    let result = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants")
            .without(RESPONSE_CONVERTER)
            .build(),
        Arc::new(StubFetcher::new()),
        query_converters(),
    );
    assert!(matches!(result, Err(FilterError::Configuration(_))));
}

#[test]
fn invalid_host_is_rejected() {
    let result = RestFilterConverter::new(
        &rest_config(GO_ID, "descendants")
            .host("not a host")
            .build(),
        Arc::new(StubFetcher::new()),
        query_converters(),
    );
    assert!(matches!(result, Err(FilterError::InvalidHostName(_))));
}

// ---------------------------------------------------------------------------
// Factories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn slimming_filter_carries_its_context_through_the_factory() {
    let body = ontology_relatives(&[
        ("GO:0000001", Some(&["GO:0000002", "GO:0000003"])),
        ("GO:0000004", Some(&["GO:0000003"])),
    ]);
    let config = rest_config(GO_ID, "slimming").build();
    let registry = ExternalFilterConfigRetrieval::new(vec![config]).unwrap();
    let factory = FilterConverterFactory::new(
        Arc::new(registry),
        Arc::new(StubFetcher::always(StubResponse::Body(body))),
    );

    let converted = factory
        .convert(&go_request(&["GO:0000001", "GO:0000004"]))
        .await
        .unwrap();
    let slimming = converted.context().unwrap().slimming().unwrap();
    assert_eq!(
        slimming.original_ids("GO:0000003").unwrap(),
        ["GO:0000001", "GO:0000004"]
    );
}

#[tokio::test]
async fn relevancy_list_through_the_rest_factory() {
    let registry = ExternalFilterConfigRetrieval::new(vec![
        rest_config("goUsageRelationships", "relevancy")
            .resource_format("QuickGO/services/ontology/relevancy/{goUsageRelationships}")
            .response_class("stringList")
            .with("responseBodyPath", "results.ids")
            .build(),
    ])
    .unwrap();
    let factory = RestFilterConverterFactory::new(
        Arc::new(registry),
        Arc::new(StubFetcher::always(StubResponse::Body(json!({
            "results": {"ids": ["GO:0000003", "GO:0000001"]}
        })))),
        Arc::new(ResponseConverterRegistry::<Vec<String>>::with_defaults()),
    );

    let request = FilterRequest::single("goUsageRelationships", ["is_a"]).unwrap();
    let converted = factory.convert(&request).await.unwrap().unwrap();
    assert_eq!(converted.into_value(), ["GO:0000003", "GO:0000001"]);
}

// ---------------------------------------------------------------------------
// HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn http_fetcher_reads_json() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/terms")
        .match_header("accept", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"results":[]}"#)
        .create_async()
        .await;

    let body = HttpResponseFetcher::new()
        .fetch(&format!("{}/terms", server.url()))
        .await
        .unwrap();
    assert_eq!(body, json!({"results": []}));
    mock.assert_async().await;
}

#[tokio::test]
async fn http_error_status_is_a_retrieval_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(500)
        .create_async()
        .await;

    let err = HttpResponseFetcher::new()
        .fetch(&format!("{}/terms", server.url()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Retrieval(_)));
}

#[tokio::test]
async fn http_invalid_json_is_a_retrieval_failure() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/terms")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("not json")
        .create_async()
        .await;

    let err = HttpResponseFetcher::new()
        .fetch(&format!("{}/terms", server.url()))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Retrieval(_)));
}

/// Full round trip: config, URL expansion, HTTP call, descendants conversion.
#[tokio::test]
async fn descendants_filter_over_http() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock(
            "GET",
            Matcher::Regex(r"^/QuickGO/services/go/terms/GO.*0000001/descendants$".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(descendants_body().to_string())
        .create_async()
        .await;

    let config = rest_config(GO_ID, "descendants")
        .host(&server.url())
        .build();
    let registry = ExternalFilterConfigRetrieval::new(vec![config]).unwrap();
    let factory = FilterConverterFactory::new(
        Arc::new(registry),
        Arc::new(HttpResponseFetcher::with_user_agent("quickgo-search-tests").unwrap()),
    );

    let converted = factory
        .convert(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert_eq!(
        converted.value().to_string(),
        r"((goId:GO\:0000002) OR (goId:GO\:0000003))"
    );
    mock.assert_async().await;
}

/// An unreachable service makes the factory match nothing.
#[tokio::test]
async fn unreachable_service_matches_nothing() {
    let registry = ExternalFilterConfigRetrieval::new(vec![
        rest_config(GO_ID, "descendants")
            .host("127.0.0.1:9")
            .timeout_millis(200)
            .build(),
    ])
    .unwrap();
    let factory =
        FilterConverterFactory::new(Arc::new(registry), Arc::new(HttpResponseFetcher::new()));

    let converted = factory
        .convert(&go_request(&["GO:0000001"]))
        .await
        .unwrap();
    assert_eq!(converted.into_value(), QuickGoQuery::filter_everything());
}
