//! SIMPLE conversion: field/value leaves.

use tracing::debug;

use super::extension::parse_extension;
use super::{ConvertedFilter, FilterConverter};
use crate::error::{FilterError, FilterResult};
use crate::fields::{
    EXTENSION, GENE_PRODUCT_SUBSET, GENE_PRODUCT_TYPE, GO_ID, GP_RELATED_AND_GO_IDS,
    GP_RELATED_GO_IDS, GP_RELATED_NOT_GO_IDS, PROTEIN, PROTEOME,
};
use crate::query::QuickGoQuery;
use crate::request::FilterRequest;

const MATCH_ANY: &str = "*";

/// ORs the values of each property and ANDs the properties together, with
/// the annotation field families below handled specially:
///
/// - `gpRelatedAndGoIds`: annotated to every id, directly or via relations
/// - `gpRelatedNotGoIds`: related to none of the ids
/// - `extension`: each value is an AND/OR expression of contains-terms
/// - `geneProductType`: decides the whole query, refining `protein` by
///   `geneProductSubset` and `proteome`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimpleFilterConverter;

impl SimpleFilterConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_query(&self, request: &FilterRequest) -> FilterResult<QuickGoQuery> {
        for (name, values) in request.properties() {
            if values.is_empty() {
                return Err(FilterError::InvalidArgument(format!(
                    "Values of property '{name}' cannot be null or empty"
                )));
            }
        }

        if let Some(types) = request.values(GENE_PRODUCT_TYPE) {
            let ignored: Vec<&str> = request
                .properties()
                .keys()
                .map(String::as_str)
                .filter(|name| ![GENE_PRODUCT_TYPE, GENE_PRODUCT_SUBSET, PROTEOME].contains(name))
                .collect();
            if !ignored.is_empty() {
                debug!(?ignored, "fields ignored alongside gene product type");
            }
            return gene_product_query(
                types,
                request.values(GENE_PRODUCT_SUBSET),
                request.values(PROTEOME),
            );
        }

        let groups = request
            .properties()
            .iter()
            .map(|(name, values)| field_query(name, values))
            .collect::<FilterResult<Vec<_>>>()?;
        QuickGoQuery::and(groups)
    }
}

impl FilterConverter for SimpleFilterConverter {
    fn transform(&self, request: &FilterRequest) -> FilterResult<ConvertedFilter<QuickGoQuery>> {
        Ok(ConvertedFilter::new(self.to_query(request)?))
    }
}

fn field_query(name: &str, values: &[String]) -> FilterResult<QuickGoQuery> {
    match name {
        GP_RELATED_AND_GO_IDS => QuickGoQuery::and([
            or_leaves(GO_ID, values)?,
            QuickGoQuery::and(leaves(GP_RELATED_GO_IDS, values)?)?,
        ]),
        GP_RELATED_NOT_GO_IDS => Ok(!or_leaves(GP_RELATED_GO_IDS, values)?),
        EXTENSION => {
            let terms = values
                .iter()
                .map(|value| {
                    if value.trim() == MATCH_ANY {
                        QuickGoQuery::create_query(EXTENSION, MATCH_ANY)
                    } else {
                        parse_extension(value)
                    }
                })
                .collect::<FilterResult<Vec<_>>>()?;
            QuickGoQuery::or(terms)
        }
        _ => or_leaves(name, values),
    }
}

/// Non-protein types stand alone; `protein` is ANDed with whichever of the
/// subset and proteome constraints are present.
fn gene_product_query(
    types: &[String],
    subsets: Option<&[String]>,
    proteomes: Option<&[String]>,
) -> FilterResult<QuickGoQuery> {
    let mut clauses = Vec::with_capacity(types.len());

    for gp_type in types {
        let leaf = QuickGoQuery::create_query(GENE_PRODUCT_TYPE, gp_type)?;
        if !gp_type.eq_ignore_ascii_case(PROTEIN) {
            clauses.push(leaf);
            continue;
        }

        let mut refined = vec![leaf];
        if let Some(subsets) = subsets {
            refined.push(or_leaves(GENE_PRODUCT_SUBSET, subsets)?);
        }
        if let Some(proteomes) = proteomes {
            refined.push(or_leaves(PROTEOME, proteomes)?);
        }
        clauses.push(QuickGoQuery::and(refined)?);
    }

    QuickGoQuery::or(clauses)
}

fn leaves(field: &str, values: &[String]) -> FilterResult<Vec<QuickGoQuery>> {
    values
        .iter()
        .map(|value| QuickGoQuery::create_query(field, value))
        .collect()
}

fn or_leaves(field: &str, values: &[String]) -> FilterResult<QuickGoQuery> {
    QuickGoQuery::or(leaves(field, values)?)
}
