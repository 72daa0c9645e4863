//! Annotation field names with special conversion rules.

pub const GO_ID: &str = "goId";
pub const EVIDENCE_CODE: &str = "evidenceCode";
pub const EXTENSION: &str = "extension";

/// GO ids an annotated gene product is related to through the ontology.
pub const GP_RELATED_GO_IDS: &str = "gpRelatedGoIds";
/// Pseudo-field: annotated to all of the ids, directly or through relations.
pub const GP_RELATED_AND_GO_IDS: &str = "gpRelatedAndGoIds";
/// Pseudo-field: not related to any of the ids.
pub const GP_RELATED_NOT_GO_IDS: &str = "gpRelatedNotGoIds";

pub const GENE_PRODUCT_TYPE: &str = "geneProductType";
pub const GENE_PRODUCT_SUBSET: &str = "geneProductSubset";
pub const PROTEOME: &str = "proteome";

/// The only gene product type refined by subset and proteome.
pub const PROTEIN: &str = "protein";
