//! Error types for the gridsense engine

use thiserror::Error;

/// Errors that can occur while aggregating telemetry or populating the cache
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Failed to parse telemetry record: {0}")]
    ParseError(String),

    #[error("Invalid timeframe: {0}")]
    InvalidTimeframe(String),

    #[error("Artifact producer failed: {0}")]
    ProducerError(String),

    #[error("Artifact shape mismatch for {kind}: {reason}")]
    ArtifactShape { kind: &'static str, reason: String },

    #[error("Encoding error: {0}")]
    EncodingError(String),
}
