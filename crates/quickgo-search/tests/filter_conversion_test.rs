//! Integration tests for filter request conversion.
//!
//! Exercises the registry, the SIMPLE and JOIN converters and the factory
//! through the public API.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use quickgo_search::converter::{FilterConverterFactory, parse_extension};
use quickgo_search::error::FilterError;
use quickgo_search::fields::{EXTENSION, GP_RELATED_GO_IDS, GP_RELATED_NOT_GO_IDS};
use quickgo_search::query::SolrQuerySerializer;
use quickgo_search::registry::{
    ExecutionType, ExternalFilterConfigRetrieval, FilterConfig, FilterConfigRetrieval,
    GlobalFilterConfigRetrieval, InternalFilterConfigRetrieval, StaticSearchableFields,
};
use quickgo_search::{FilterRequest, QuickGoQuery};
use quickgo_test_utils::{StubFetcher, StubResponse, join_config};

const FILTER_CONFIG_YAML: &str = r#"
filterConfigs:
  - signature: goEvidence
    execution: JOIN
    properties:
      fromTable: ontology
      fromAttribute: id
      toTable: annotation
      toAttribute: goId
  - signature: taxonId
    execution: JOIN
    properties:
      fromTable: taxonomy
      fromAttribute: id
      toTable: annotation
      toAttribute: taxonId
"#;

fn leaf(field: &str, value: &str) -> QuickGoQuery {
    QuickGoQuery::create_query(field, value).unwrap()
}

fn registry() -> GlobalFilterConfigRetrieval {
    let internal = InternalFilterConfigRetrieval::new(&StaticSearchableFields::new([
        "taxonId",
        "assignedBy",
        "goId",
        EXTENSION,
        GP_RELATED_NOT_GO_IDS,
    ]));
    let external = ExternalFilterConfigRetrieval::from_yaml_str(FILTER_CONFIG_YAML).unwrap();
    GlobalFilterConfigRetrieval::new(&internal, &external)
}

fn factory() -> FilterConverterFactory {
    FilterConverterFactory::new(
        Arc::new(registry()),
        Arc::new(StubFetcher::always(StubResponse::Retrieval(
            "no REST filters configured".to_string(),
        ))),
    )
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// An internal SIMPLE config shadows an external config with the same signature.
#[test]
fn internal_config_wins_over_external() {
    let registry = registry();
    let config = registry.config_for_signature("taxonId").unwrap().unwrap();
    assert_eq!(config.execution, ExecutionType::Simple);

    let joined = registry
        .config_for_signature("goEvidence")
        .unwrap()
        .unwrap();
    assert_eq!(joined.execution, ExecutionType::Join);
}

/// Repeated lookups return the same config.
#[test]
fn lookup_is_idempotent() {
    let registry = registry();
    let first = registry
        .config_for_signature("assignedBy")
        .unwrap()
        .cloned();
    let second = registry
        .config_for_signature("assignedBy")
        .unwrap()
        .cloned();
    assert_eq!(first, second);
}

#[test]
fn blank_and_unknown_signatures() {
    let registry = registry();
    assert!(matches!(
        registry.config_for_signature("  "),
        Err(FilterError::InvalidArgument(_))
    ));
    let unknown = registry.config_for_signature("unknownField").unwrap();
    assert!(unknown.is_none());
}

// ---------------------------------------------------------------------------
// SIMPLE conversion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn single_value_is_a_leaf() {
    let request = FilterRequest::single("assignedBy", ["UniProt"]).unwrap();
    let converted = factory().convert(&request).await.unwrap();
    assert_eq!(converted.into_value(), leaf("assignedBy", "UniProt"));
}

#[tokio::test]
async fn values_of_one_field_are_ored() {
    let request = FilterRequest::single("assignedBy", ["UniProt", "IntAct", "UniProt"]).unwrap();
    let converted = factory().convert(&request).await.unwrap();
    assert_eq!(
        converted.into_value(),
        QuickGoQuery::or([leaf("assignedBy", "UniProt"), leaf("assignedBy", "IntAct")]).unwrap()
    );
}

/// Requests for two different fields are ANDed by `convert_all`.
#[tokio::test]
async fn two_fields_are_anded() {
    let requests = [
        FilterRequest::single("taxonId", ["9606"]).unwrap(),
        FilterRequest::single("assignedBy", ["UniProt"]).unwrap(),
    ];
    let converted = factory().convert_all(&requests).await.unwrap();
    assert_eq!(
        converted.into_value(),
        QuickGoQuery::and([leaf("taxonId", "9606"), leaf("assignedBy", "UniProt")]).unwrap()
    );
}

#[tokio::test]
async fn extension_expression_is_parsed() {
    let request = FilterRequest::single(EXTENSION, ["a AND b OR c"]).unwrap();
    let converted = factory().convert(&request).await.unwrap();

    let contains = |value: &str| QuickGoQuery::create_contain_query(EXTENSION, value).unwrap();
    let expected = QuickGoQuery::or([
        QuickGoQuery::and([contains("a"), contains("b")]).unwrap(),
        contains("c"),
    ])
    .unwrap();
    assert_eq!(converted.value(), &expected);
    assert_eq!(parse_extension("a AND b OR c").unwrap(), expected);
}

#[tokio::test]
async fn related_not_go_ids_negate_the_related_leaf() {
    let request = FilterRequest::single(GP_RELATED_NOT_GO_IDS, ["GO:0000002"]).unwrap();
    let converted = factory().convert(&request).await.unwrap();
    assert_eq!(
        converted.into_value(),
        QuickGoQuery::not(leaf(GP_RELATED_GO_IDS, "GO:0000002"))
    );
}

#[tokio::test]
async fn unknown_signature_is_a_configuration_error() {
    let request = FilterRequest::single("unknownField", ["x"]).unwrap();
    assert!(matches!(
        factory().convert(&request).await,
        Err(FilterError::Configuration(_))
    ));
}

// ---------------------------------------------------------------------------
// JOIN conversion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn join_config_from_yaml_wraps_the_simple_filter() {
    let request = FilterRequest::single("goEvidence", ["IEA"]).unwrap();
    let converted = factory().convert(&request).await.unwrap();
    assert_eq!(
        converted.value().to_string(),
        "{!join from=id to=goId fromIndex=ontology} (goEvidence:IEA)"
    );
}

/// A JOIN config survives a JSON round trip and still converts the same way.
#[tokio::test]
async fn join_config_round_trips_through_serde() {
    let config = join_config("aspect", "ontology", "id", "annotation", "goId");
    let rebuilt: FilterConfig =
        serde_json::from_str(&serde_json::to_string(&config).unwrap()).unwrap();
    assert_eq!(rebuilt, config);

    let external = ExternalFilterConfigRetrieval::new(vec![rebuilt]).unwrap();
    let factory = FilterConverterFactory::new(
        Arc::new(external),
        Arc::new(StubFetcher::always(StubResponse::Retrieval("unused".to_string()))),
    );

    let request = FilterRequest::single("aspect", ["process", "function"]).unwrap();
    let query = factory.convert(&request).await.unwrap().into_value();
    let expected = QuickGoQuery::create_join_query_with_filter(
        "ontology",
        "id",
        "annotation",
        "goId",
        QuickGoQuery::or([leaf("aspect", "process"), leaf("aspect", "function")]).unwrap(),
    )
    .unwrap();
    assert_eq!(query, expected);
}

// ---------------------------------------------------------------------------
// Serialisation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn combined_query_serialises_for_solr() {
    let requests = [
        FilterRequest::single("taxonId", ["9606", "10090"]).unwrap(),
        FilterRequest::single(GP_RELATED_NOT_GO_IDS, ["GO:0000002"]).unwrap(),
    ];
    let converted = factory().convert_all(&requests).await.unwrap();

    let serializer = SolrQuerySerializer::with_terms_fields(["taxonId"]);
    assert_eq!(
        serializer.serialize(converted.value()),
        r"(({!terms f=taxonId}9606,10090) AND NOT ((gpRelatedGoIds:GO\:0000002)))"
    );
}

#[test]
fn equal_trees_hash_equally() {
    use std::collections::HashSet;

    let a = QuickGoQuery::or([leaf("f", "1"), leaf("f", "2")]).unwrap();
    let b = QuickGoQuery::or([leaf("f", "2"), leaf("f", "1")]).unwrap();
    let set: HashSet<_> = [a, b].into_iter().collect();
    assert_eq!(set.len(), 1);
}
