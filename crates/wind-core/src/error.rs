//! Error types for the wind pipeline.

use thiserror::Error;

/// Result type alias using WindError.
pub type WindResult<T> = Result<T, WindError>;

/// Primary error type for wind-overlay operations.
///
/// Anything below the level boundary (retrieval, decoding, dimension
/// selection) is caught by the orchestrator and recorded in the level's
/// output metadata; the validation variants are configuration errors and
/// abort the whole run.
#[derive(Debug, Error)]
pub enum WindError {
    // === Input validation ===
    #[error("Invalid region: {0}")]
    InvalidRegion(String),

    #[error("Invalid sampling spacing: {0}")]
    InvalidSpacing(String),

    #[error("Invalid level '{key}': {message}")]
    InvalidLevel { key: String, message: String },

    #[error("Invalid time specification: {0}")]
    InvalidTime(String),

    // === Collaborator errors ===
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Failed to decode grid: {0}")]
    Decode(String),

    #[error("Missing variable in decoded grid: {0}")]
    MissingVariable(String),

    // === Extraction errors ===
    #[error("Level '{key}' does not match the field's vertical dimension: {message}")]
    DimensionMismatch { key: String, message: String },
}

impl WindError {
    /// Whether this error is fatal for the whole run rather than a single
    /// level (see the propagation policy in the batch driver).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            WindError::InvalidRegion(_)
                | WindError::InvalidSpacing(_)
                | WindError::InvalidLevel { .. }
                | WindError::InvalidTime(_)
        )
    }
}
