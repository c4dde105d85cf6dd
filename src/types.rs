//! Core types for the gridsense aggregation pipeline
//!
//! This module defines the data structures that flow through each stage:
//! normalized readings, time-window buckets, metric snapshots, and the
//! dashboard report delivered at the consumer boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// One normalized telemetry sample.
///
/// Immutable once produced by the normalizer; aggregation functions borrow
/// readings for the duration of a call and never mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Instant the sample was taken (UTC)
    pub timestamp: DateTime<Utc>,
    /// Energy consumed since the previous sample (kWh), finite and >= 0
    pub energy_used_kwh: f64,
    /// Line current (A), 0 when the source omitted it
    #[serde(default)]
    pub current_a: f64,
    /// Line voltage (V), 0 when the source omitted it
    #[serde(default)]
    pub voltage_v: f64,
    /// Instantaneous power (W), 0 when the source omitted it
    #[serde(default)]
    pub power_w: f64,
    /// Power factor, 0 when the source omitted it
    #[serde(default)]
    pub power_factor: f64,
}

impl Reading {
    /// Age of this reading relative to `now`, in whole seconds.
    /// Readings stamped in the future report an age of 0.
    pub fn age_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.timestamp).num_seconds().max(0)
    }
}

/// Requested aggregation resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    /// 24 buckets keyed by clock hour over the last 24 hours
    Hour,
    /// 7 buckets keyed by weekday over the last 7 days
    Day,
    /// 4 buckets keyed by ISO week over the last 28 days
    Week,
}

impl Timeframe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Hour => "hour",
            Timeframe::Day => "day",
            Timeframe::Week => "week",
        }
    }

    /// Number of buckets this resolution always yields
    pub fn bucket_count(&self) -> usize {
        match self {
            Timeframe::Hour => 24,
            Timeframe::Day => 7,
            Timeframe::Week => 4,
        }
    }

    /// Width of the applicable range before bucketing, in hours
    pub fn range_hours(&self) -> i64 {
        match self {
            Timeframe::Hour => 24,
            Timeframe::Day => 7 * 24,
            Timeframe::Week => 28 * 24,
        }
    }
}

impl FromStr for Timeframe {
    type Err = EngineError;

    /// Accepts the canonical names plus the dashboard's historical aliases
    /// ("24h" for hourly, "month" for the 4-week view).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" | "24h" | "hourly" => Ok(Timeframe::Hour),
            "day" | "daily" | "7d" => Ok(Timeframe::Day),
            "week" | "weekly" | "month" | "28d" => Ok(Timeframe::Week),
            other => Err(EngineError::InvalidTimeframe(other.to_string())),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A labeled, fixed time window with its readings and their energy sum.
///
/// Buckets for a timeframe partition the applicable range into a stable label
/// sequence; the label set never shrinks when data is sparse, so chart axes
/// stay put.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bucket {
    /// Display label ("13:00", "Tue", "Week 34")
    pub label: String,
    /// Inclusive window start (most recent occurrence of this label's window)
    pub window_start: DateTime<Utc>,
    /// Exclusive window end
    pub window_end: DateTime<Utc>,
    /// Readings grouped into this bucket, in input order
    pub readings: Vec<Reading>,
    /// Sum of `energy_used_kwh` over `readings`
    pub total_kwh: f64,
}

/// Consumption statistics derived from a reading set.
///
/// A pure function's output: recomputed on demand, never persisted
/// independently of its inputs. Values are unrounded; call [`Self::rounded`]
/// at the point of external exposure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumptionMetrics {
    /// Current-month total divided by days elapsed this month (kWh)
    pub daily_average_kwh: f64,
    /// Strictly maximal single reading over the full history (kWh)
    pub peak_usage_kwh: f64,
    /// Timestamp of the peak reading; None when the history is empty
    pub peak_timestamp: Option<DateTime<Utc>>,
    /// Total consumption in the current calendar month (kWh)
    pub total_monthly_kwh: f64,
}

impl ConsumptionMetrics {
    /// Copy with energy figures rounded to 3 decimal places for display
    pub fn rounded(&self) -> Self {
        Self {
            daily_average_kwh: crate::metrics::round_kwh(self.daily_average_kwh),
            peak_usage_kwh: crate::metrics::round_kwh(self.peak_usage_kwh),
            peak_timestamp: self.peak_timestamp,
            total_monthly_kwh: crate::metrics::round_kwh(self.total_monthly_kwh),
        }
    }
}

/// Cost projections derived from consumption metrics and a tariff rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostMetrics {
    /// Projected bill for the current month
    pub monthly_estimate: f64,
    /// Average cost per day this month
    pub daily_average_cost: f64,
    /// Assumed savings from shifting ~10% of usage off peak hours
    pub potential_savings: f64,
    /// Tariff applied (currency units per kWh)
    pub rate_per_kwh: f64,
}

impl CostMetrics {
    /// Copy with currency figures rounded to 2 decimal places for display
    pub fn rounded(&self) -> Self {
        Self {
            monthly_estimate: crate::metrics::round_currency(self.monthly_estimate),
            daily_average_cost: crate::metrics::round_currency(self.daily_average_cost),
            potential_savings: crate::metrics::round_currency(self.potential_savings),
            rate_per_kwh: self.rate_per_kwh,
        }
    }
}

/// Binary device liveness judgment from the most recent reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LivenessState {
    /// Latest reading is non-zero and at most one hour old
    Active,
    /// Anything else, including an empty history
    Inactive,
}

impl LivenessState {
    pub fn as_str(&self) -> &'static str {
        match self {
            LivenessState::Active => "Active",
            LivenessState::Inactive => "Inactive",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, LivenessState::Active)
    }
}

impl fmt::Display for LivenessState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Producer metadata attached to every report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    pub instance_id: String,
}

/// Complete dashboard snapshot delivered at the consumer boundary.
///
/// All energy figures are rounded to 3 decimal places and all currency
/// figures to 2; nothing upstream of this struct is rounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardReport {
    pub producer: ReportProducer,
    pub generated_at: DateTime<Utc>,
    pub timeframe: Timeframe,
    pub liveness: LivenessState,
    pub buckets: Vec<Bucket>,
    pub consumption: ConsumptionMetrics,
    pub cost: CostMetrics,
    /// Monthly goal in effect (configured or fallback)
    pub monthly_goal_kwh: f64,
    /// Percent of the monthly goal consumed, clamped to [0, 100]
    pub monthly_progress_pct: f64,
    /// Energy consumed since UTC midnight (kWh)
    pub units_today_kwh: f64,
    /// Daily budget derived from the monthly goal (goal / 30)
    pub daily_limit_kwh: f64,
    /// Percent of the daily budget consumed, clamped to [0, 100]
    pub daily_limit_progress_pct: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeframe_parses_aliases() {
        assert_eq!("24h".parse::<Timeframe>().unwrap(), Timeframe::Hour);
        assert_eq!("month".parse::<Timeframe>().unwrap(), Timeframe::Week);
        assert_eq!("day".parse::<Timeframe>().unwrap(), Timeframe::Day);
        assert!("fortnight".parse::<Timeframe>().is_err());
    }

    #[test]
    fn timeframe_bucket_counts() {
        assert_eq!(Timeframe::Hour.bucket_count(), 24);
        assert_eq!(Timeframe::Day.bucket_count(), 7);
        assert_eq!(Timeframe::Week.bucket_count(), 4);
    }

    #[test]
    fn reading_age_clamps_future_timestamps() {
        let now = Utc::now();
        let reading = Reading {
            timestamp: now + chrono::Duration::minutes(5),
            energy_used_kwh: 1.0,
            current_a: 0.0,
            voltage_v: 0.0,
            power_w: 0.0,
            power_factor: 0.0,
        };
        assert_eq!(reading.age_seconds(now), 0);
    }
}
