//! Response converters for ontology relatives returned by the ontology service.
//!
//! This module provides:
//! - DescendantsFilterConverter: OR over the descendants of the requested terms
//! - AndDescendantsFilterConverter: gene products annotated to every requested term
//! - SlimmingFilterConverter: OR over descendants, remembering which slim term each came from

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::converter::{
    ConversionContext, ConversionInfo, ConvertedFilter, ResponseConverter, SlimmingConversionInfo,
};
use crate::error::{FilterError, FilterResult};
use crate::fields::{EVIDENCE_CODE, GO_ID, GP_RELATED_GO_IDS};
use crate::query::QuickGoQuery;

/// Response type shared by every converter in this module.
pub const ONTOLOGY_RELATIVES: &str = "ontologyRelatives";

/// # Panics
///
/// Panics if the hard-coded regex literal is invalid (impossible in practice).
#[allow(clippy::expect_used)]
static GO_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^GO:\d{7}$").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static ECO_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ECO:\d{7}$").expect("valid regex literal"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OntologyRelatives {
    #[serde(default)]
    pub results: Option<Vec<OntologyRelative>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OntologyRelative {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub descendants: Option<Vec<String>>,
}

impl OntologyRelatives {
    /// A JSON `null` reads as a response without results.
    pub fn from_value(value: Value) -> FilterResult<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| FilterError::Retrieval(format!("Unreadable ontology response: {e}")))
    }
}

/// Schema field holding ids of this kind: `goId` for GO terms, `evidenceCode`
/// for ECO terms.
pub fn id_field(id: &str) -> FilterResult<&'static str> {
    if GO_TERM.is_match(id) {
        Ok(GO_ID)
    } else if ECO_TERM.is_match(id) {
        Ok(EVIDENCE_CODE)
    } else {
        Err(FilterError::Retrieval(format!(
            "Unknown ID encountered: {id}. Expected either GO/ECO term."
        )))
    }
}

fn query_for_id(id: &str) -> FilterResult<QuickGoQuery> {
    QuickGoQuery::create_query(id_field(id)?, id)
}

/// Walks the results shared by all three converters.
///
/// Returns `None` when there were no results at all. Every non-blank
/// descendant is passed to `visit` with the id of the term it belongs to.
fn visit_descendants(
    response: Value,
    mut visit: impl FnMut(&str, &str) -> FilterResult<()>,
) -> FilterResult<Option<()>> {
    let results = match OntologyRelatives::from_value(response)?.results {
        Some(results) if !results.is_empty() => results,
        _ => return Ok(None),
    };

    let mut without_descendants = Vec::new();
    for result in &results {
        match &result.descendants {
            Some(descendants) => {
                for descendant in descendants.iter().map(|d| d.trim()) {
                    if !descendant.is_empty() {
                        visit(&result.id, descendant)?;
                    }
                }
            }
            None if !result.id.trim().is_empty() => without_descendants.push(result.id.as_str()),
            None => {}
        }
    }

    if !without_descendants.is_empty() {
        return Err(FilterError::Retrieval(format!(
            "No descendants found for IDs, {}",
            without_descendants.join(", ")
        )));
    }
    Ok(Some(()))
}

fn filter_everything() -> ConvertedFilter<QuickGoQuery> {
    ConvertedFilter::new(QuickGoQuery::filter_everything())
}

/// OR over a field-appropriate leaf per distinct descendant.
#[derive(Debug, Clone, Copy, Default)]
pub struct DescendantsFilterConverter;

impl DescendantsFilterConverter {
    pub const NAME: &'static str = "descendants";
}

impl ResponseConverter<QuickGoQuery> for DescendantsFilterConverter {
    fn response_type(&self) -> &str {
        ONTOLOGY_RELATIVES
    }

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let mut queries = Vec::new();
        let visited = visit_descendants(response, |_, descendant| {
            queries.push(query_for_id(descendant)?);
            Ok(())
        })?;

        match visited {
            Some(()) if !queries.is_empty() => Ok(ConvertedFilter::new(QuickGoQuery::or(queries)?)),
            _ => Ok(filter_everything()),
        }
    }
}

/// Gene products related to every requested term, restricted to annotations
/// on any of the descendants.
#[derive(Debug, Clone, Copy, Default)]
pub struct AndDescendantsFilterConverter;

impl AndDescendantsFilterConverter {
    pub const NAME: &'static str = "andDescendants";
}

impl ResponseConverter<QuickGoQuery> for AndDescendantsFilterConverter {
    fn response_type(&self) -> &str {
        ONTOLOGY_RELATIVES
    }

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let mut related = Vec::new();
        let mut annotated = Vec::new();
        let visited = visit_descendants(response, |_, descendant| {
            related.push(QuickGoQuery::create_query(GP_RELATED_GO_IDS, descendant)?);
            annotated.push(query_for_id(descendant)?);
            Ok(())
        })?;

        match visited {
            Some(()) if !related.is_empty() => {
                let query = QuickGoQuery::and([
                    QuickGoQuery::and(related)?,
                    QuickGoQuery::or(annotated)?,
                ])?;
                Ok(ConvertedFilter::new(query))
            }
            _ => Ok(filter_everything()),
        }
    }
}

/// OR over `goId` descendants; the context maps each descendant back to the
/// slim terms it was reached from.
#[derive(Debug, Clone, Copy, Default)]
pub struct SlimmingFilterConverter;

impl SlimmingFilterConverter {
    pub const NAME: &'static str = "slimming";
}

impl ResponseConverter<QuickGoQuery> for SlimmingFilterConverter {
    fn response_type(&self) -> &str {
        ONTOLOGY_RELATIVES
    }

    fn convert(&self, response: Value) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        let mut descendants = BTreeSet::new();
        let mut info = SlimmingConversionInfo::new();
        let visited = visit_descendants(response, |original, descendant| {
            descendants.insert(descendant.to_string());
            info.add_original_id(descendant, original);
            Ok(())
        })?;

        if visited.is_none() || descendants.is_empty() {
            return Ok(filter_everything());
        }

        let query = QuickGoQuery::or(
            descendants
                .iter()
                .map(|descendant| QuickGoQuery::create_query(GO_ID, descendant))
                .collect::<FilterResult<Vec<_>>>()?,
        )?;
        Ok(ConvertedFilter::with_context(
            query,
            ConversionContext::new(ConversionInfo::Slimming(info)),
        ))
    }
}
