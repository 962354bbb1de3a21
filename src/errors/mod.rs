//! Unified error handling for the conversion pipeline.

use serde_json::error::Category;

/// Conversion error type distinguishing bad input from broken mapping logic.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Data provided is not JSON parsable. Check input format.")]
    MalformedInput(#[source] serde_json::Error),

    #[error("Parameter mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Internal error!\nCaused by:\n  {0}")]
    Internal(String),

    #[error("Failed to decode audit report: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ConversionError {
    /// Classify a raw JSON parse failure.
    ///
    /// Syntax and premature end-of-input failures mean the caller supplied
    /// something that is not JSON; everything else propagates unchanged.
    pub fn from_parse(err: serde_json::Error) -> Self {
        match err.classify() {
            Category::Syntax | Category::Eof => Self::MalformedInput(err),
            Category::Io | Category::Data => Self::Json(err),
        }
    }

    /// Wrap a failure raised after the input was parsed.
    pub fn internal(cause: impl std::fmt::Display) -> Self {
        Self::Internal(cause.to_string())
    }

    /// Check if this error is the caller's fault (unparsable input).
    pub fn is_malformed_input(&self) -> bool {
        matches!(self, Self::MalformedInput(_))
    }

    /// Check if this error originates from the conversion logic.
    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal(_))
    }
}
