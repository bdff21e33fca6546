#![forbid(unsafe_code)]

/// Why a stored order record could not be used.
#[derive(Debug, thiserror::Error)]
pub enum OrderRecordError {
    #[error("not valid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected a json array, found {0}")]
    NotArray(&'static str),
    #[error("entry {index} is not a string")]
    NonString { index: usize },
}
