//! Threshold configuration for status classification and alerting.
//!
//! Built-in defaults exist for every quantity; a JSON file may override any
//! subset of fields. Loading merges the persisted overrides onto the
//! defaults field-by-field, so a file containing only
//! `{"mq135": {"poor": 400}}` is legal and leaves every other quantity at
//! its default. A malformed file falls back entirely to defaults with a
//! warning.
//!
//! Classification and alerting both read the store on every evaluation
//! rather than caching the config, so edits take effect on the very next
//! request.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---

/// Optimal/acceptable band pair for temperature, humidity and soil
/// moisture. Inside the optimal band is Optimal, inside the acceptable
/// band is Acceptable, everything else is Critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandThresholds {
    pub optimal_min: f64,
    pub optimal_max: f64,
    pub acceptable_min: f64,
    pub acceptable_max: f64,
}

/// Good band plus acceptable ceiling for the CO2 estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Co2Thresholds {
    pub good_min: f64,
    pub good_max: f64,
    pub acceptable_max: f64,
}

/// MQ135 cutoffs: at or below `good` is Good, above `poor` is Poor,
/// between is Moderate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AirQualityThresholds {
    pub good: f64,
    pub poor: f64,
}

/// MQ2/MQ7 cutoffs: at or below `safe` is Safe, above `high` is High,
/// between is Elevated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasThresholds {
    pub safe: f64,
    pub high: f64,
}

/// Effective threshold configuration, one sub-structure per quantity.
///
/// Light bands are intentionally absent: they are fixed in `derive` and
/// not user-editable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub temperature: BandThresholds,
    pub humidity: BandThresholds,
    pub soil_moisture: BandThresholds,
    pub co2: Co2Thresholds,
    pub mq135: AirQualityThresholds,
    pub mq2: GasThresholds,
    pub mq7: GasThresholds,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        // Greenhouse bands for most vegetables; gas cutoffs from the
        // deployed MQ-series calibration.
        Self {
            temperature: BandThresholds {
                optimal_min: 20.0,
                optimal_max: 27.0,
                acceptable_min: 18.0,
                acceptable_max: 30.0,
            },
            humidity: BandThresholds {
                optimal_min: 45.0,
                optimal_max: 70.0,
                acceptable_min: 45.0,
                acceptable_max: 80.0,
            },
            soil_moisture: BandThresholds {
                optimal_min: 40.0,
                optimal_max: 60.0,
                acceptable_min: 30.0,
                acceptable_max: 70.0,
            },
            co2: Co2Thresholds {
                good_min: 300.0,
                good_max: 800.0,
                acceptable_max: 1500.0,
            },
            mq135: AirQualityThresholds {
                good: 200.0,
                poor: 500.0,
            },
            mq2: GasThresholds {
                safe: 300.0,
                high: 750.0,
            },
            mq7: GasThresholds {
                safe: 300.0,
                high: 750.0,
            },
        }
    }
}

// ---

/// Partial override document as persisted on disk or submitted over the
/// API. Every field is optional; omitted fields keep their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ThresholdOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<BandOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<BandOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<BandOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub co2: Option<Co2Override>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mq135: Option<AirQualityOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mq2: Option<GasOverride>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mq7: Option<GasOverride>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BandOverride {
    pub optimal_min: Option<f64>,
    pub optimal_max: Option<f64>,
    pub acceptable_min: Option<f64>,
    pub acceptable_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Co2Override {
    pub good_min: Option<f64>,
    pub good_max: Option<f64>,
    pub acceptable_max: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AirQualityOverride {
    pub good: Option<f64>,
    pub poor: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GasOverride {
    pub safe: Option<f64>,
    pub high: Option<f64>,
}

fn merge(target: &mut f64, value: Option<f64>) {
    // ---
    if let Some(v) = value {
        *target = v;
    }
}

impl ThresholdConfig {
    /// Apply a partial override document field-by-field.
    pub fn apply(&mut self, overrides: &ThresholdOverrides) {
        // ---
        if let Some(o) = &overrides.temperature {
            merge(&mut self.temperature.optimal_min, o.optimal_min);
            merge(&mut self.temperature.optimal_max, o.optimal_max);
            merge(&mut self.temperature.acceptable_min, o.acceptable_min);
            merge(&mut self.temperature.acceptable_max, o.acceptable_max);
        }
        if let Some(o) = &overrides.humidity {
            merge(&mut self.humidity.optimal_min, o.optimal_min);
            merge(&mut self.humidity.optimal_max, o.optimal_max);
            merge(&mut self.humidity.acceptable_min, o.acceptable_min);
            merge(&mut self.humidity.acceptable_max, o.acceptable_max);
        }
        if let Some(o) = &overrides.soil_moisture {
            merge(&mut self.soil_moisture.optimal_min, o.optimal_min);
            merge(&mut self.soil_moisture.optimal_max, o.optimal_max);
            merge(&mut self.soil_moisture.acceptable_min, o.acceptable_min);
            merge(&mut self.soil_moisture.acceptable_max, o.acceptable_max);
        }
        if let Some(o) = &overrides.co2 {
            merge(&mut self.co2.good_min, o.good_min);
            merge(&mut self.co2.good_max, o.good_max);
            merge(&mut self.co2.acceptable_max, o.acceptable_max);
        }
        if let Some(o) = &overrides.mq135 {
            merge(&mut self.mq135.good, o.good);
            merge(&mut self.mq135.poor, o.poor);
        }
        if let Some(o) = &overrides.mq2 {
            merge(&mut self.mq2.safe, o.safe);
            merge(&mut self.mq2.high, o.high);
        }
        if let Some(o) = &overrides.mq7 {
            merge(&mut self.mq7.safe, o.safe);
            merge(&mut self.mq7.high, o.high);
        }
    }

    /// Defaults with a partial override document applied.
    pub fn merged(overrides: &ThresholdOverrides) -> Self {
        // ---
        let mut config = Self::default();
        config.apply(overrides);
        config
    }
}

// ---

/// File-backed store for the threshold override document.
#[derive(Debug, Clone)]
pub struct ThresholdStore {
    path: PathBuf,
}

impl ThresholdStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        // ---
        Self { path: path.into() }
    }

    /// Effective configuration: built-in defaults with any persisted
    /// overrides merged on top. Never fails — a missing file means "no
    /// overrides" and a malformed one falls back to defaults with a
    /// warning.
    pub fn load(&self) -> ThresholdConfig {
        // ---
        ThresholdConfig::merged(&self.load_overrides())
    }

    /// The persisted override document itself (empty when the file is
    /// missing or malformed).
    pub fn load_overrides(&self) -> ThresholdOverrides {
        // ---
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return ThresholdOverrides::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!(
                    "malformed threshold file {:?}, using built-in defaults: {}",
                    self.path,
                    e
                );
                ThresholdOverrides::default()
            }
        }
    }

    /// Persist an override document, replacing any previous one. Edits
    /// apply on the next classification since nothing caches the config.
    pub fn save(&self, overrides: &ThresholdOverrides) -> Result<()> {
        // ---
        let body = serde_json::to_string_pretty(overrides)?;
        fs::write(&self.path, body)
            .with_context(|| format!("failed to write threshold file {:?}", self.path))?;
        Ok(())
    }
}
