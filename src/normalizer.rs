//! Reading normalization
//!
//! Telemetry arrives as a mapping of opaque record ids to loosely typed
//! payloads: timestamps are strings, numeric fields may be numbers or numeric
//! strings, optional fields may be absent. This module coerces each record
//! into a canonical [`Reading`] or drops it.
//!
//! Dropping is the only error signal at this layer: a malformed record is
//! filtered out, never surfaced as a fault.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::debug;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use crate::types::Reading;

/// Raw telemetry record as pushed by the source, before validation.
///
/// Every field is optional at this stage; the normalizer decides what is
/// required and what defaults to zero.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReading {
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub energy_used: Option<Value>,
    #[serde(default)]
    pub current: Option<Value>,
    #[serde(default)]
    pub voltage: Option<Value>,
    #[serde(default)]
    pub power: Option<Value>,
    #[serde(default)]
    pub power_factor: Option<Value>,
}

/// Normalizer for coercing raw records into canonical readings
pub struct Normalizer;

impl Normalizer {
    /// Normalize a single raw record.
    ///
    /// Returns `None` when the timestamp is absent or unparseable, when
    /// `energy_used` is absent, or when the coerced energy value is not a
    /// finite non-negative number. Optional electrical fields default to 0.
    pub fn normalize(raw: &RawReading) -> Option<Reading> {
        let timestamp = raw.timestamp.as_deref().and_then(parse_instant)?;

        let energy_used_kwh = raw.energy_used.as_ref().and_then(coerce_f64)?;
        if !energy_used_kwh.is_finite() || energy_used_kwh < 0.0 {
            return None;
        }

        Some(Reading {
            timestamp,
            energy_used_kwh,
            current_a: opt_f64(&raw.current),
            voltage_v: opt_f64(&raw.voltage),
            power_w: opt_f64(&raw.power),
            power_factor: opt_f64(&raw.power_factor),
        })
    }

    /// Normalize a batch keyed by opaque record id.
    ///
    /// Invalid records are dropped; survivors are returned sorted by
    /// timestamp ascending.
    pub fn normalize_batch(records: &HashMap<String, RawReading>) -> Vec<Reading> {
        let total = records.len();
        let mut readings: Vec<Reading> = records.values().filter_map(Self::normalize).collect();

        let dropped = total - readings.len();
        if dropped > 0 {
            debug!("normalizer dropped {dropped} of {total} records");
        }

        readings.sort_by_key(|r| r.timestamp);
        readings
    }
}

/// Parse an instant from RFC 3339 or a naive `YYYY-MM-DDTHH:MM:SS` string
/// (naive timestamps are taken as UTC).
fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

/// Coerce a JSON value to f64: numbers pass through, numeric strings parse
fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn opt_f64(value: &Option<Value>) -> f64 {
    value
        .as_ref()
        .and_then(coerce_f64)
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
