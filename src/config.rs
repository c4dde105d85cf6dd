//! Engine configuration
//!
//! Tariff and goal settings. All values are plain constants for a deployment;
//! nothing here is derived from telemetry.

use serde::{Deserialize, Serialize};

/// Default tariff in currency units per kWh
pub const DEFAULT_RATE_PER_KWH: f64 = 44.0;

/// Monthly goal applied when the user has not configured one (kWh)
pub const DEFAULT_MONTHLY_GOAL_KWH: f64 = 200.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Fixed linear tariff used for all cost conversions
    pub rate_per_kwh: f64,
    /// User-configured monthly consumption goal; `None` falls back to
    /// [`DEFAULT_MONTHLY_GOAL_KWH`]
    pub monthly_goal_kwh: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rate_per_kwh: DEFAULT_RATE_PER_KWH,
            monthly_goal_kwh: None,
        }
    }
}

impl EngineConfig {
    /// The goal in effect: configured value when set and positive, fallback
    /// otherwise
    pub fn effective_goal_kwh(&self) -> f64 {
        match self.monthly_goal_kwh {
            Some(goal) if goal > 0.0 => goal,
            _ => DEFAULT_MONTHLY_GOAL_KWH,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn goal_falls_back_when_unset_or_invalid() {
        let config = EngineConfig::default();
        assert_eq!(config.effective_goal_kwh(), DEFAULT_MONTHLY_GOAL_KWH);

        let zero = EngineConfig {
            monthly_goal_kwh: Some(0.0),
            ..Default::default()
        };
        assert_eq!(zero.effective_goal_kwh(), DEFAULT_MONTHLY_GOAL_KWH);

        let set = EngineConfig {
            monthly_goal_kwh: Some(320.0),
            ..Default::default()
        };
        assert_eq!(set.effective_goal_kwh(), 320.0);
    }

    #[test]
    fn round_trips_through_json() {
        let config = EngineConfig {
            rate_per_kwh: 52.5,
            monthly_goal_kwh: Some(250.0),
        };
        let json = config.to_json().unwrap();
        assert_eq!(EngineConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config.rate_per_kwh, DEFAULT_RATE_PER_KWH);
        assert_eq!(config.monthly_goal_kwh, None);
    }
}
