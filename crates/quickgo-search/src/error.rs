//! Filter conversion error types.

use thiserror::Error;

/// Errors raised while resolving, converting, or aggregating filters.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Caller defect: blank names, empty value lists, bad numeric properties.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Deployment defect: unknown signature or a config missing required properties.
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid host name: {0}")]
    InvalidHostName(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Upstream data could not be retrieved or made sense of.
    #[error("retrieval error: {0}")]
    Retrieval(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl FilterError {
    /// Failures a REST lookup degrades on instead of propagating.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            FilterError::Retrieval(_) | FilterError::IllegalState(_)
        )
    }
}

/// Failures reported by a [`ResponseFetcher`](crate::converter::ResponseFetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to fetch REST response: {0}")]
    Retrieval(String),

    #[error("REST call timed out after {0} ms")]
    Timeout(u64),

    #[error("illegal state: {0}")]
    IllegalState(String),

    /// Anything the caller did not anticipate; never swallowed.
    #[error(transparent)]
    Unexpected(anyhow::Error),
}

impl FetchError {
    pub fn is_soft(&self) -> bool {
        !matches!(self, FetchError::Unexpected(_))
    }
}

/// Result type alias using FilterError.
pub type FilterResult<T> = Result<T, FilterError>;
