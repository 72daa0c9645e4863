//! Query tree and its Solr rendering.
//!
//! - QuickGoQuery: immutable AND/OR/NOT/leaf/join expression tree
//! - SolrQuerySerializer: renders a tree as a Solr query string

mod model;
pub mod solr;

pub use model::{JoinQuery, QueryKind, QuickGoQuery};
pub use solr::SolrQuerySerializer;
