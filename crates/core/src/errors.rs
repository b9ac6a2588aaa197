use thiserror::Error;

/// Failure modes of the catalog operations.
///
/// An empty result set is never an error: `lookup_premiums` and
/// `recommend_plans` return `Ok` with an empty vec when nothing is eligible.
/// Only name lookups produce `NotFound`, and `Storage` is reserved for a
/// broken or unreachable catalog, surfaced as-is to the caller.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no catalog entry matches `{query}`")]
    NotFound { query: String },
}

impl CatalogError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn not_found(query: impl Into<String>) -> Self {
        Self::NotFound { query: query.into() }
    }
}
