//! Consumption and cost metrics
//!
//! Aggregate statistics over a reading history: current-month totals, daily
//! average, peak selection, tariff-based cost projections, and goal progress.
//! All functions are pure; rounding happens only in the display-facing
//! `rounded()` snapshots and the helpers below, never mid-computation.

use chrono::{DateTime, Datelike, Utc};

use crate::types::{ConsumptionMetrics, CostMetrics, Reading};

/// Fraction of the monthly estimate assumed recoverable by off-peak shifting
const SAVINGS_FRACTION: f64 = 0.1;

/// Days used to spread a monthly goal into a daily budget
const GOAL_SPREAD_DAYS: f64 = 30.0;

/// Derive consumption statistics from the full reading history.
///
/// Monthly figures cover readings in the current calendar month and year of
/// `now`. Peak selection scans the entire history under strict `>`, so the
/// first-seen maximal reading wins ties and the peak is monotonic
/// non-decreasing as readings accumulate. Empty input yields zeros.
pub fn consumption_metrics(readings: &[Reading], now: DateTime<Utc>) -> ConsumptionMetrics {
    let total_monthly_kwh: f64 = readings
        .iter()
        .filter(|r| r.timestamp.month() == now.month() && r.timestamp.year() == now.year())
        .map(|r| r.energy_used_kwh)
        .sum();

    let day_of_month = now.day();
    let daily_average_kwh = if day_of_month > 0 {
        total_monthly_kwh / day_of_month as f64
    } else {
        0.0
    };

    let mut peak: Option<&Reading> = None;
    for reading in readings {
        match peak {
            Some(current) if reading.energy_used_kwh > current.energy_used_kwh => {
                peak = Some(reading)
            }
            None => peak = Some(reading),
            _ => {}
        }
    }

    ConsumptionMetrics {
        daily_average_kwh,
        peak_usage_kwh: peak.map(|r| r.energy_used_kwh).unwrap_or(0.0),
        peak_timestamp: peak.map(|r| r.timestamp),
        total_monthly_kwh,
    }
}

/// Project costs from consumption under a fixed linear tariff
pub fn cost_metrics(consumption: &ConsumptionMetrics, rate_per_kwh: f64) -> CostMetrics {
    let monthly_estimate = consumption.total_monthly_kwh * rate_per_kwh;
    CostMetrics {
        monthly_estimate,
        daily_average_cost: consumption.daily_average_kwh * rate_per_kwh,
        potential_savings: monthly_estimate * SAVINGS_FRACTION,
        rate_per_kwh,
    }
}

/// Percent of a monthly goal consumed, clamped to [0, 100].
///
/// Consumption may exceed the goal; the displayed percentage never does.
/// A non-positive goal yields 0 rather than dividing by zero.
pub fn monthly_progress(consumed_kwh: f64, goal_kwh: f64) -> f64 {
    if goal_kwh <= 0.0 {
        return 0.0;
    }
    (consumed_kwh / goal_kwh * 100.0).clamp(0.0, 100.0)
}

/// Energy consumed since UTC midnight of `now`'s date
pub fn units_consumed_today(readings: &[Reading], now: DateTime<Utc>) -> f64 {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc();
    readings
        .iter()
        .filter(|r| r.timestamp >= day_start && r.timestamp <= now)
        .map(|r| r.energy_used_kwh)
        .sum()
}

/// Daily budget implied by a monthly goal (goal spread over 30 days)
pub fn daily_limit(goal_kwh: f64) -> f64 {
    if goal_kwh > 0.0 {
        goal_kwh / GOAL_SPREAD_DAYS
    } else {
        0.0
    }
}

/// Percent of the daily budget consumed today, clamped to [0, 100]
pub fn daily_limit_progress(consumed_today_kwh: f64, limit_kwh: f64) -> f64 {
    if limit_kwh <= 0.0 {
        return 0.0;
    }
    (consumed_today_kwh / limit_kwh * 100.0).clamp(0.0, 100.0)
}

/// Monthly consumption estimate from a steady instantaneous power draw (kWh)
pub fn monthly_estimate_from_power(power_w: f64) -> f64 {
    power_w * 24.0 * 30.0 / 1000.0
}

/// Round an energy figure to 3 decimal places for external exposure
pub fn round_kwh(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Round a currency figure to 2 decimal places for external exposure
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn reading(ts: &str, kwh: f64) -> Reading {
        Reading {
            timestamp: ts.parse().unwrap(),
            energy_used_kwh: kwh,
            current_a: 0.0,
            voltage_v: 0.0,
            power_w: 0.0,
            power_factor: 0.0,
        }
    }

    #[test]
    fn daily_average_divides_by_day_of_month() {
        let now: DateTime<Utc> = "2024-05-15T12:00:00Z".parse().unwrap();
        let readings: Vec<Reading> = (1..=15)
            .map(|d| reading(&format!("2024-05-{d:02}T08:00:00Z"), 2.0))
            .collect();

        let metrics = consumption_metrics(&readings, now);
        assert_eq!(metrics.total_monthly_kwh, 30.0);
        assert_eq!(metrics.daily_average_kwh, 2.0);
    }

    #[test]
    fn monthly_total_excludes_other_months_and_years() {
        let now: DateTime<Utc> = "2024-05-10T12:00:00Z".parse().unwrap();
        let readings = vec![
            reading("2024-05-01T08:00:00Z", 3.0),
            reading("2024-04-30T08:00:00Z", 7.0),
            reading("2023-05-01T08:00:00Z", 9.0),
        ];
        let metrics = consumption_metrics(&readings, now);
        assert_eq!(metrics.total_monthly_kwh, 3.0);
    }

    #[test]
    fn peak_ties_resolve_to_first_seen() {
        let now: DateTime<Utc> = "2024-05-10T12:00:00Z".parse().unwrap();
        let readings = vec![
            reading("2024-05-01T08:00:00Z", 1.0),
            reading("2024-05-02T08:00:00Z", 4.5),
            reading("2024-05-03T08:00:00Z", 4.5),
        ];
        let metrics = consumption_metrics(&readings, now);
        assert_eq!(metrics.peak_usage_kwh, 4.5);
        assert_eq!(
            metrics.peak_timestamp.unwrap().to_rfc3339(),
            "2024-05-02T08:00:00+00:00"
        );
    }

    #[test]
    fn peak_is_monotonic_as_readings_accumulate() {
        let now = Utc::now();
        let mut readings = Vec::new();
        let mut last_peak = 0.0;
        for (i, kwh) in [0.5, 2.0, 1.0, 2.0, 0.1].iter().enumerate() {
            readings.push(Reading {
                timestamp: now - Duration::hours(10 - i as i64),
                energy_used_kwh: *kwh,
                current_a: 0.0,
                voltage_v: 0.0,
                power_w: 0.0,
                power_factor: 0.0,
            });
            let metrics = consumption_metrics(&readings, now);
            assert!(metrics.peak_usage_kwh >= last_peak);
            last_peak = metrics.peak_usage_kwh;
        }
    }

    #[test]
    fn empty_history_yields_zeros() {
        let metrics = consumption_metrics(&[], Utc::now());
        assert_eq!(metrics.peak_usage_kwh, 0.0);
        assert_eq!(metrics.peak_timestamp, None);
        assert_eq!(metrics.daily_average_kwh, 0.0);
        assert_eq!(metrics.total_monthly_kwh, 0.0);
    }

    #[test]
    fn cost_is_linear_in_rate() {
        let consumption = ConsumptionMetrics {
            daily_average_kwh: 2.0,
            peak_usage_kwh: 5.0,
            peak_timestamp: None,
            total_monthly_kwh: 60.0,
        };
        let cost = cost_metrics(&consumption, 44.0);
        assert_eq!(cost.monthly_estimate, 2640.0);
        assert_eq!(cost.daily_average_cost, 88.0);
        assert_eq!(cost.potential_savings, 264.0);
        assert_eq!(cost.rate_per_kwh, 44.0);
    }

    #[test]
    fn monthly_progress_clamps_at_100() {
        assert_eq!(monthly_progress(250.0, 200.0), 100.0);
        assert_eq!(monthly_progress(100.0, 200.0), 50.0);
        assert_eq!(monthly_progress(50.0, 0.0), 0.0);
    }

    #[test]
    fn units_today_sum_since_midnight() {
        let now: DateTime<Utc> = "2024-05-10T12:00:00Z".parse().unwrap();
        let readings = vec![
            reading("2024-05-10T01:00:00Z", 1.0),
            reading("2024-05-10T11:00:00Z", 2.0),
            reading("2024-05-09T23:00:00Z", 8.0),
        ];
        assert_eq!(units_consumed_today(&readings, now), 3.0);
    }

    #[test]
    fn daily_limit_spreads_goal() {
        assert_eq!(daily_limit(300.0), 10.0);
        assert_eq!(daily_limit(0.0), 0.0);
        assert_eq!(daily_limit_progress(5.0, 10.0), 50.0);
        assert_eq!(daily_limit_progress(15.0, 10.0), 100.0);
        assert_eq!(daily_limit_progress(5.0, 0.0), 0.0);
    }

    #[test]
    fn power_based_monthly_estimate() {
        // 500 W steady draw: 0.5 kW * 24 h * 30 d = 360 kWh
        assert_eq!(monthly_estimate_from_power(500.0), 360.0);
    }

    #[test]
    fn rounding_only_at_exposure() {
        let consumption = ConsumptionMetrics {
            daily_average_kwh: 1.23456,
            peak_usage_kwh: 2.00049,
            peak_timestamp: None,
            total_monthly_kwh: 37.0368,
        };
        let display = consumption.rounded();
        assert_eq!(display.daily_average_kwh, 1.235);
        assert_eq!(display.peak_usage_kwh, 2.0);
        assert_eq!(display.total_monthly_kwh, 37.037);

        let cost = cost_metrics(&consumption, 44.0).rounded();
        assert_eq!(cost.monthly_estimate, round_currency(37.0368 * 44.0));
    }
}
