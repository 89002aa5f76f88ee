use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

/// Client-side failure modes for deck operations. Local validation produces
/// the same variants as server rejections, so callers handle both uniformly.
#[derive(Debug, Error)]
pub enum DeckError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("network error: {0}")]
    Network(#[from] anyhow::Error),
}

impl DeckError {
    pub fn from_api(err: ApiError) -> Self {
        match err.code {
            ErrorCode::Validation => DeckError::Validation(err.message),
            ErrorCode::NotFound => DeckError::NotFound(err.message),
            ErrorCode::UnsupportedMedia => DeckError::UnsupportedMedia(err.message),
            ErrorCode::Internal => DeckError::Network(anyhow::anyhow!(err.message)),
        }
    }
}
