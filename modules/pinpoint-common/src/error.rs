use thiserror::Error;

/// Failure taxonomy for the overlay. Every variant renders as a short,
/// user-presentable message; callers surface `Display` output directly.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Could not detect the map location. Try navigating the map first.")]
    ViewUnavailable,

    #[error("Places API key not found. Please set it before searching.")]
    MissingCredential,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Search failed: {0}")]
    SearchFailed(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
