//! Time-window bucketing
//!
//! Partitions a reading sequence into a fixed, label-stable bucket sequence
//! for a requested timeframe:
//!
//! - **Hour**: 24 buckets over the last 24 hours, keyed by clock hour
//! - **Day**: 7 buckets over the last 7 days, keyed by weekday name
//! - **Week**: 4 buckets over the current and 3 preceding ISO weeks
//!
//! Hour and day grouping is by clock component, not elapsed time: a reading
//! 25 hours old that survives the range filter lands in the bucket matching
//! its hour-of-day. This is the display-oriented grouping the dashboard
//! expects, not a strict rolling window. Labels are always emitted in full,
//! with zero sums where no data exists.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use std::collections::HashMap;

use crate::types::{Bucket, Reading, Timeframe};

/// Bucket a reading sequence at the requested resolution.
///
/// Readings outside the timeframe's applicable range are ignored. Within each
/// bucket, energy values are summed; the result is total consumption per
/// window in kWh.
pub fn bucket_readings(readings: &[Reading], timeframe: Timeframe, now: DateTime<Utc>) -> Vec<Bucket> {
    match timeframe {
        Timeframe::Hour => bucket_by_hour(readings, now),
        Timeframe::Day => bucket_by_weekday(readings, now),
        Timeframe::Week => bucket_by_iso_week(readings, now),
    }
}

/// Convenience projection of a bucket sequence onto its sums
pub fn bucket_sums(buckets: &[Bucket]) -> Vec<f64> {
    buckets.iter().map(|b| b.total_kwh).collect()
}

/// 24 buckets labeled by clock hour, oldest first, ending at the hour of `now`
fn bucket_by_hour(readings: &[Reading], now: DateTime<Utc>) -> Vec<Bucket> {
    let cutoff = now - Duration::hours(24);

    let mut by_hour: HashMap<u32, Vec<Reading>> = HashMap::new();
    for reading in readings {
        if reading.timestamp >= cutoff && reading.timestamp <= now {
            by_hour
                .entry(reading.timestamp.hour())
                .or_default()
                .push(reading.clone());
        }
    }

    (0..24)
        .rev()
        .map(|i| {
            let anchor = now - Duration::hours(i);
            let window_start = truncate_to_hour(anchor);
            let grouped = by_hour.remove(&anchor.hour()).unwrap_or_default();
            make_bucket(
                format!("{}:00", anchor.hour()),
                window_start,
                window_start + Duration::hours(1),
                grouped,
            )
        })
        .collect()
}

/// 7 buckets labeled by weekday short name, chronological, ending at the
/// weekday of `now`
fn bucket_by_weekday(readings: &[Reading], now: DateTime<Utc>) -> Vec<Bucket> {
    let cutoff = now - Duration::days(7);

    let mut by_weekday: HashMap<String, Vec<Reading>> = HashMap::new();
    for reading in readings {
        if reading.timestamp >= cutoff && reading.timestamp <= now {
            by_weekday
                .entry(reading.timestamp.weekday().to_string())
                .or_default()
                .push(reading.clone());
        }
    }

    (0..7)
        .rev()
        .map(|i| {
            let anchor = now - Duration::days(i);
            let window_start = truncate_to_day(anchor);
            let label = anchor.weekday().to_string();
            let grouped = by_weekday.remove(&label).unwrap_or_default();
            make_bucket(label, window_start, window_start + Duration::days(1), grouped)
        })
        .collect()
}

/// 4 buckets labeled by ISO week-of-year: the current week and the 3 before it.
///
/// The applicable range starts at the Monday of the oldest labeled week, so
/// every retained reading belongs to exactly one label and the partition is
/// exhaustive even across a year boundary (labels are derived from the four
/// anchor dates, so week numbers wrap naturally).
fn bucket_by_iso_week(readings: &[Reading], now: DateTime<Utc>) -> Vec<Bucket> {
    let anchors: Vec<DateTime<Utc>> = (0..4).rev().map(|i| now - Duration::weeks(i)).collect();
    let oldest_week_start = start_of_iso_week(anchors[0]);

    let mut by_week: HashMap<u32, Vec<Reading>> = HashMap::new();
    for reading in readings {
        if reading.timestamp >= oldest_week_start && reading.timestamp <= now {
            by_week
                .entry(reading.timestamp.iso_week().week())
                .or_default()
                .push(reading.clone());
        }
    }

    anchors
        .into_iter()
        .map(|anchor| {
            let week = anchor.iso_week().week();
            let window_start = start_of_iso_week(anchor);
            let grouped = by_week.remove(&week).unwrap_or_default();
            make_bucket(
                format!("Week {week}"),
                window_start,
                window_start + Duration::weeks(1),
                grouped,
            )
        })
        .collect()
}

fn make_bucket(
    label: String,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    readings: Vec<Reading>,
) -> Bucket {
    let total_kwh = readings.iter().map(|r| r.energy_used_kwh).sum();
    Bucket {
        label,
        window_start,
        window_end,
        readings,
        total_kwh,
    }
}

fn truncate_to_hour(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(instant.hour(), 0, 0)
        .expect("hour of an existing instant is valid")
        .and_utc()
}

fn truncate_to_day(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is valid")
        .and_utc()
}

fn start_of_iso_week(instant: DateTime<Utc>) -> DateTime<Utc> {
    let days_from_monday = instant.weekday().num_days_from_monday() as i64;
    truncate_to_day(instant) - Duration::days(days_from_monday)
}
