use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Query errors
    #[error("'{0}' is not a term in the vocabulary")]
    UnknownTerm(String),

    // Input validation errors
    #[error("invalid weighting scheme '{scheme}': {reason}")]
    InvalidScheme { scheme: String, reason: String },

    #[error("normalization scheme '{0}' invalid, must be either 'l' (lemmatization) or 's' (stemming)")]
    InvalidNormalization(String),

    #[error("collection name '{0}' invalid, must be a plain name without path separators or '..'")]
    InvalidCollection(String),

    #[error("evaluation metric '{0}' invalid, must be either 'mrr' or 'map'")]
    InvalidMetric(String),

    // Storage errors
    #[error("no index found at {path}")]
    IndexNotFound { path: PathBuf },

    #[error("there is no valid collection at {path}")]
    CollectionNotFound { path: PathBuf },

    #[error("collection parse error on line {line}: {message}")]
    Collection { line: usize, message: String },

    // Serialization errors
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
