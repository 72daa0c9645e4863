//! Aggregate functions supported by the search backend.

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregateFunction {
    /// Number of documents.
    Count,
    /// Number of distinct values of a field.
    Unique,
    Sum,
}

impl AggregateFunction {
    /// Name used in backend facet declarations and response keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Unique => "unique",
            Self::Sum => "sum",
        }
    }
}

impl std::str::FromStr for AggregateFunction {
    type Err = FilterError;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "count" => Ok(Self::Count),
            "unique" => Ok(Self::Unique),
            "sum" => Ok(Self::Sum),
            _ => Err(FilterError::InvalidArgument(format!(
                "Unrecognized aggregation function: {s:?} (expected count, unique, or sum)"
            ))),
        }
    }
}

impl std::fmt::Display for AggregateFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
