//! AI-derived artifact shapes
//!
//! The external producer (a generative model or scoring service) returns
//! loosely structured JSON. This module defines the expected response shapes
//! as a tagged union and validates documents at the boundary instead of
//! passing untyped JSON through to consumers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EngineError;

/// Request category for a derived artifact.
///
/// Doubles as the cache-key tag, so the string forms are part of the cache's
/// observable behavior and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Forecast of the next month's usage pattern
    Predict,
    /// Weekly energy-saving score over five boolean criteria
    PredictScore,
    /// Short actionable insight list
    Analytics,
}

impl ArtifactKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Predict => "predict",
            ArtifactKind::PredictScore => "predict-score",
            ArtifactKind::Analytics => "analytics",
        }
    }
}

/// Predicted usage series: one label and one kWh value per future point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSeries {
    pub labels: Vec<String>,
    pub data: Vec<f64>,
}

/// Five-criteria saving score; `true` means the criterion is expected to be met
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingScore {
    pub peak_hour_usage: bool,
    pub sudden_high_use: bool,
    pub night_time_usage: bool,
    pub weekly_change: bool,
    pub daily_usage_spread: bool,
}

/// Severity attached to an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightStatus {
    Danger,
    Warning,
    Success,
}

/// One actionable insight sentence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub text: String,
    pub status: InsightStatus,
}

/// Validated artifact, tagged by the request kind that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "kebab-case")]
pub enum Artifact {
    Predict(PredictionSeries),
    PredictScore(SavingScore),
    Analytics(Vec<Insight>),
}

impl Artifact {
    /// Validate a raw producer response against the expected shape for `kind`.
    ///
    /// Mismatched documents are rejected; nothing partially parsed is ever
    /// returned.
    pub fn from_response(kind: ArtifactKind, value: Value) -> Result<Self, EngineError> {
        let shape_err = |e: serde_json::Error| EngineError::ArtifactShape {
            kind: kind.as_str(),
            reason: e.to_string(),
        };
        match kind {
            ArtifactKind::Predict => {
                let series: PredictionSeries = serde_json::from_value(value).map_err(shape_err)?;
                if series.labels.len() != series.data.len() {
                    return Err(EngineError::ArtifactShape {
                        kind: kind.as_str(),
                        reason: format!(
                            "label/data length mismatch: {} vs {}",
                            series.labels.len(),
                            series.data.len()
                        ),
                    });
                }
                Ok(Artifact::Predict(series))
            }
            ArtifactKind::PredictScore => Ok(Artifact::PredictScore(
                serde_json::from_value(value).map_err(shape_err)?,
            )),
            ArtifactKind::Analytics => Ok(Artifact::Analytics(
                serde_json::from_value(value).map_err(shape_err)?,
            )),
        }
    }

    /// The kind this artifact was validated under
    pub fn kind(&self) -> ArtifactKind {
        match self {
            Artifact::Predict(_) => ArtifactKind::Predict,
            Artifact::PredictScore(_) => ArtifactKind::PredictScore,
            Artifact::Analytics(_) => ArtifactKind::Analytics,
        }
    }
}
