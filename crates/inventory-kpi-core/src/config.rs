use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use crate::KpiError;

/// Recognized pipeline options.
///
/// `anchor_date` pins "today" for trailing-window calculations. When unset
/// the run anchors on the latest fact date in the snapshot, never on the
/// wall clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub window_days: u32,
    pub lead_time_multiplier: f64,
    pub low_inventory_threshold_ratio: f64,
    pub overstock_threshold: f64,
    pub understock_threshold: f64,
    pub anchor_date: Option<Date>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            window_days: 30,
            lead_time_multiplier: 2.0,
            low_inventory_threshold_ratio: 1.0,
            overstock_threshold: 1.5,
            understock_threshold: 0.5,
            anchor_date: None,
        }
    }
}

impl PipelineConfig {
    /// Validates option domains.
    ///
    /// # Errors
    /// Returns [`KpiError::Configuration`] when one or more options are
    /// outside their valid domain.
    pub fn validate(&self) -> Result<(), KpiError> {
        if self.window_days == 0 {
            return Err(KpiError::Configuration(
                "window_days MUST be >= 1".to_string(),
            ));
        }

        if !self.lead_time_multiplier.is_finite() || self.lead_time_multiplier < 0.0 {
            return Err(KpiError::Configuration(
                "lead_time_multiplier MUST be a finite value >= 0".to_string(),
            ));
        }

        for (name, value) in [
            (
                "low_inventory_threshold_ratio",
                self.low_inventory_threshold_ratio,
            ),
            ("overstock_threshold", self.overstock_threshold),
            ("understock_threshold", self.understock_threshold),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(KpiError::Configuration(format!(
                    "{name} MUST be a finite value > 0"
                )));
            }
        }

        if self.understock_threshold >= self.overstock_threshold {
            return Err(KpiError::Configuration(
                "understock_threshold MUST be below overstock_threshold".to_string(),
            ));
        }

        Ok(())
    }

    /// Decodes and validates a configuration from JSON. Missing fields take
    /// their defaults.
    ///
    /// # Errors
    /// Returns [`KpiError::Configuration`] when JSON decoding fails or the
    /// decoded values violate option domains.
    pub fn from_json(value: &Value) -> Result<Self, KpiError> {
        let config: Self = serde_json::from_value(value.clone()).map_err(|err| {
            KpiError::Configuration(format!("invalid pipeline config JSON payload: {err}"))
        })?;
        config.validate()?;
        Ok(config)
    }
}
