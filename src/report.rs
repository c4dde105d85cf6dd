//! Dashboard report assembly
//!
//! Builds the complete consumer-boundary snapshot from a reading history:
//! buckets for the requested timeframe, consumption and cost metrics, goal
//! progress, and liveness, stamped with producer metadata. This is the one
//! place where numeric outputs are rounded for display.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::bucket::bucket_readings;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::metrics::{
    consumption_metrics, cost_metrics, daily_limit, daily_limit_progress, monthly_progress,
    round_kwh, units_consumed_today,
};
use crate::types::{DashboardReport, Reading, ReportProducer, Timeframe};
use crate::{ENGINE_VERSION, PRODUCER_NAME};
use crate::{liveness, metrics};

/// Report builder carrying a stable producer instance id
pub struct ReportBuilder {
    instance_id: String,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportBuilder {
    /// Create a builder with a fresh instance id
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4().to_string(),
        }
    }

    /// Create a builder with a specific instance id
    pub fn with_instance_id(instance_id: String) -> Self {
        Self { instance_id }
    }

    /// Assemble a dashboard report from an already-normalized history.
    ///
    /// Pure apart from the embedded metadata: the same readings, timeframe,
    /// config, and `now` always produce the same figures.
    pub fn build(
        &self,
        readings: &[Reading],
        timeframe: Timeframe,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> DashboardReport {
        let buckets = bucket_readings(readings, timeframe, now);
        let consumption = consumption_metrics(readings, now);
        let cost = cost_metrics(&consumption, config.rate_per_kwh);

        let goal = config.effective_goal_kwh();
        let units_today = units_consumed_today(readings, now);
        let limit = daily_limit(goal);

        DashboardReport {
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: ENGINE_VERSION.to_string(),
                instance_id: self.instance_id.clone(),
            },
            generated_at: now,
            timeframe,
            liveness: liveness::evaluate(liveness::latest_reading(readings), now),
            buckets,
            monthly_progress_pct: metrics::round_currency(monthly_progress(
                consumption.total_monthly_kwh,
                goal,
            )),
            consumption: consumption.rounded(),
            cost: cost.rounded(),
            monthly_goal_kwh: goal,
            units_today_kwh: round_kwh(units_today),
            daily_limit_kwh: round_kwh(limit),
            daily_limit_progress_pct: metrics::round_currency(daily_limit_progress(
                units_today,
                limit,
            )),
        }
    }

    /// Assemble and serialize in one step
    pub fn build_to_json(
        &self,
        readings: &[Reading],
        timeframe: Timeframe,
        config: &EngineConfig,
        now: DateTime<Utc>,
    ) -> Result<String, EngineError> {
        let report = self.build(readings, timeframe, config, now);
        serde_json::to_string(&report).map_err(|e| EngineError::EncodingError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LivenessState;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn reading(ts: DateTime<Utc>, kwh: f64) -> Reading {
        Reading {
            timestamp: ts,
            energy_used_kwh: kwh,
            current_a: 0.0,
            voltage_v: 0.0,
            power_w: 0.0,
            power_factor: 0.0,
        }
    }

    #[test]
    fn report_carries_producer_metadata() {
        let builder = ReportBuilder::with_instance_id("fixed".to_string());
        let report = builder.build(&[], Timeframe::Hour, &EngineConfig::default(), Utc::now());
        assert_eq!(report.producer.name, PRODUCER_NAME);
        assert_eq!(report.producer.instance_id, "fixed");
        assert_eq!(report.producer.version, ENGINE_VERSION);
    }

    #[test]
    fn empty_history_reports_inactive_and_zeroed() {
        let builder = ReportBuilder::new();
        let report = builder.build(&[], Timeframe::Day, &EngineConfig::default(), Utc::now());
        assert_eq!(report.liveness, LivenessState::Inactive);
        assert_eq!(report.buckets.len(), 7);
        assert_eq!(report.consumption.total_monthly_kwh, 0.0);
        assert_eq!(report.monthly_progress_pct, 0.0);
    }

    #[test]
    fn fresh_reading_makes_report_active() {
        // Mid-month timestamp keeps the readings inside one calendar month
        let now: DateTime<Utc> = "2024-07-15T10:00:00Z".parse().unwrap();
        let readings = vec![
            reading(now - Duration::minutes(30), 1.5),
            reading(now - Duration::hours(3), 2.5),
        ];

        let builder = ReportBuilder::new();
        let config = EngineConfig {
            monthly_goal_kwh: Some(8.0),
            ..Default::default()
        };
        let report = builder.build(&readings, Timeframe::Hour, &config, now);

        assert_eq!(report.liveness, LivenessState::Active);
        assert_eq!(report.consumption.total_monthly_kwh, 4.0);
        assert_eq!(report.monthly_goal_kwh, 8.0);
        assert_eq!(report.monthly_progress_pct, 50.0);
        assert_eq!(report.units_today_kwh, 4.0);
    }

    #[test]
    fn progress_clamps_when_consumption_exceeds_goal() {
        let now: DateTime<Utc> = "2024-07-15T10:00:00Z".parse().unwrap();
        let readings = vec![reading(now - Duration::hours(1), 250.0)];
        let config = EngineConfig {
            monthly_goal_kwh: Some(200.0),
            ..Default::default()
        };
        let report = ReportBuilder::new().build(&readings, Timeframe::Week, &config, now);
        assert_eq!(report.monthly_progress_pct, 100.0);
    }

    #[test]
    fn serializes_to_json() {
        let builder = ReportBuilder::new();
        let json = builder
            .build_to_json(&[], Timeframe::Hour, &EngineConfig::default(), Utc::now())
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["timeframe"], "hour");
        assert_eq!(value["buckets"].as_array().unwrap().len(), 24);
        assert_eq!(value["liveness"], "Inactive");
    }
}
