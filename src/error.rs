use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One offending request field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Malformed, out-of-catalog or out-of-range input. Always raised before any store access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid search request: {}", summary(.fields))]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

fn summary(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{} ({})", f.field, f.message))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            fields: vec![FieldError::new(field, message)],
        }
    }

    /// Whether `field` is among the offending fields
    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f.field == field)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected store payload: {0}")]
    Decode(String),
}

impl StoreError {
    /// Transient failures the caller may retry. Nothing here retries automatically.
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable(_) => true,
            StoreError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Decode(_) => false,
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Decode(e.to_string())
    }
}

/// Request-level failure of a search
#[derive(Debug, Error)]
pub enum ExploreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ExploreError {
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            ExploreError::Validation(v) => Some(v),
            ExploreError::Store(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ExploreError>;
