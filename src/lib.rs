//! Gridsense - aggregation engine for household electrical telemetry
//!
//! Gridsense turns irregular, loosely typed meter readings into the derived
//! views a monitoring dashboard needs, through a deterministic pipeline:
//! normalization → time-window bucketing → metrics → report assembly.
//! Alongside it, a memoized response cache fronts the expensive generative
//! calls that produce forecasts, saving scores, and insights.
//!
//! ## Modules
//!
//! - **normalizer**: raw record batches → canonical readings
//! - **bucket**: hour/day/week label-stable bucketing
//! - **metrics**: consumption, cost, and goal-progress statistics
//! - **liveness**: Active/Inactive from the latest reading
//! - **cache** / **artifact**: deduplicating store for validated AI artifacts
//! - **pipeline** / **report**: orchestration and the consumer-boundary snapshot

pub mod artifact;
pub mod bucket;
pub mod cache;
pub mod config;
pub mod error;
pub mod liveness;
pub mod metrics;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod types;

pub use artifact::{Artifact, ArtifactKind, Insight, InsightStatus, PredictionSeries, SavingScore};
pub use cache::{ArtifactProducer, ArtifactRequest, CacheEntry, ResponseCache};
pub use config::EngineConfig;
pub use error::EngineError;
pub use normalizer::{Normalizer, RawReading};
pub use pipeline::{aggregate_records, EnergyProcessor};
pub use report::ReportBuilder;
pub use types::{
    Bucket, ConsumptionMetrics, CostMetrics, DashboardReport, LivenessState, Reading, Timeframe,
};

/// Engine version embedded in report metadata
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report metadata
pub const PRODUCER_NAME: &str = "gridsense";
