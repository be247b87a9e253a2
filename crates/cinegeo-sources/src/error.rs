use cinegeo_core::CoreError;
use thiserror::Error;

/// Errors that reach callers of this crate.
///
/// Upstream failures never appear here; they are absorbed where they occur
/// and surface as empty results or missing enrichment.
#[derive(Debug, Error)]
pub enum SourcesError {
    #[error(transparent)]
    Validation(#[from] CoreError),

    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("no search center given and no recorded position available")]
    NoPosition,

    #[error("unknown POI category: {0}")]
    UnknownCategory(String),
}
