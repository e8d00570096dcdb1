//! Engine error types

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the orchestration layer.
///
/// Detector-level functions never return these; short or degenerate series
/// produce sentinel results (`Trend::Stable`, an empty anomaly list)
/// instead. Only conditions that make an entire report meaningless are
/// raised as errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Malformed or unsupported analysis request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The series provider resolved zero usable series
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// The AI-backed narrative call failed or timed out
    #[error("Narrative generation failed: {0}")]
    NarrativeGeneration(String),

    /// The series provider itself failed
    #[error("Series provider error: {0}")]
    SeriesProvider(String),
}

impl Error {
    /// Stable machine-readable code used in HTTP error envelopes
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidRequest(_) => "invalid_request",
            Error::InsufficientData(_) => "insufficient_data",
            Error::NarrativeGeneration(_) => "narrative_generation_failed",
            Error::SeriesProvider(_) => "series_provider_error",
        }
    }
}
