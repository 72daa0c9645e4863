//! QuickGO search filter library.
//!
//! Turns client filter requests into composable boolean queries for the
//! search backend, and models the aggregations the backend returns.
//! The `quickgo-filter` binary is a command-line front end over it.

pub mod aggregate;
pub mod config;
pub mod converter;
pub mod error;
pub mod fields;
pub mod ontology;
pub mod query;
pub mod registry;
pub mod relevancy;
pub mod request;

pub use error::{FetchError, FilterError, FilterResult};
pub use query::QuickGoQuery;
pub use request::FilterRequest;
