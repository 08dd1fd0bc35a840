//! Data models for the greenhouse telemetry pipeline.
//!
//! The raw upstream record is an untyped JSON map (see `normalize`); this
//! module holds the two typed shapes the rest of the service works with:
//! [`CanonicalReading`] (normalized snapshot, cached) and [`DerivedReading`]
//! (computed fields plus per-quantity classification, rebuilt per request so
//! threshold edits apply live).
//!
//! Every status a classifier can produce is an enum variant here, and each
//! variant carries an explicit severity assignment. The client keys alarm
//! colors off the severity tier, so there is deliberately no free-text
//! status anywhere in the API.

use serde::{Deserialize, Serialize};

// ---

/// Coarse severity tier behind every classified status.
///
/// Drives the color token and the client's alert styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Optimal,
    Warning,
    Critical,
    Unknown,
}

impl Severity {
    /// Hex color token shown by the client for this tier.
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Optimal => "#4CAF50",
            Severity::Warning => "#FFC107",
            Severity::Critical => "#F44336",
            Severity::Unknown => "#9E9E9E",
        }
    }
}

/// Band classification used by temperature, humidity and soil moisture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BandStatus {
    Optimal,
    Acceptable,
    Critical,
    Unknown,
}

impl BandStatus {
    pub fn severity(&self) -> Severity {
        match self {
            BandStatus::Optimal => Severity::Optimal,
            BandStatus::Acceptable => Severity::Warning,
            BandStatus::Critical => Severity::Critical,
            BandStatus::Unknown => Severity::Unknown,
        }
    }
}

/// Two-cutoff classification for the MQ2/MQ7 gas channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasStatus {
    Safe,
    Elevated,
    High,
}

impl GasStatus {
    pub fn severity(&self) -> Severity {
        match self {
            GasStatus::Safe => Severity::Optimal,
            GasStatus::Elevated => Severity::Warning,
            GasStatus::High => Severity::Critical,
        }
    }
}

/// MQ135 air-quality classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AirQualityStatus {
    Good,
    Moderate,
    Poor,
}

impl AirQualityStatus {
    pub fn severity(&self) -> Severity {
        match self {
            AirQualityStatus::Good => Severity::Optimal,
            AirQualityStatus::Moderate => Severity::Warning,
            AirQualityStatus::Poor => Severity::Critical,
        }
    }
}

/// Estimated-CO2 classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Co2Status {
    Good,
    Acceptable,
    High,
}

impl Co2Status {
    pub fn severity(&self) -> Severity {
        match self {
            Co2Status::Good => Severity::Optimal,
            Co2Status::Acceptable => Severity::Warning,
            Co2Status::High => Severity::Critical,
        }
    }
}

/// Ambient light classification over the raw 0–4095 intensity value.
///
/// The dark-side bands map to the neutral `unknown` tier: darkness is the
/// expected night state of a greenhouse, not a fault condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LightStatus {
    #[serde(rename = "Dark Night")]
    DarkNight,
    #[serde(rename = "Low Light")]
    LowLight,
    #[serde(rename = "Dim Indoor")]
    DimIndoor,
    Moderate,
    Bright,
}

impl LightStatus {
    pub fn severity(&self) -> Severity {
        match self {
            LightStatus::DarkNight => Severity::Unknown,
            LightStatus::LowLight => Severity::Unknown,
            LightStatus::DimIndoor => Severity::Unknown,
            LightStatus::Moderate => Severity::Warning,
            LightStatus::Bright => Severity::Optimal,
        }
    }
}

/// Combined judgment over the MQ135 channel and the CO2 estimate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombinedAirStatus {
    Optimal,
    Good,
    Moderate,
    High,
    Critical,
}

impl CombinedAirStatus {
    pub fn severity(&self) -> Severity {
        match self {
            CombinedAirStatus::Optimal => Severity::Optimal,
            CombinedAirStatus::Good => Severity::Optimal,
            CombinedAirStatus::Moderate => Severity::Warning,
            CombinedAirStatus::High => Severity::Critical,
            CombinedAirStatus::Critical => Severity::Critical,
        }
    }
}

/// Flame sensor verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlameStatus {
    #[serde(rename = "Flame Detected")]
    Detected,
    #[serde(rename = "Flame Not Detected")]
    NotDetected,
}

impl FlameStatus {
    pub fn severity(&self) -> Severity {
        match self {
            FlameStatus::Detected => Severity::Critical,
            FlameStatus::NotDetected => Severity::Optimal,
        }
    }
}

// ---

/// Normalized form of one sensor snapshot.
///
/// Field names follow the upstream wire vocabulary so a serialized reading
/// round-trips through the normalizer unchanged. `timestamp` is epoch
/// seconds and always present; gas drops are never negative; `light_raw`
/// is always populated (0 when upstream omitted both raw and percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReading {
    // ---
    pub timestamp: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_bmp280: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature_dht22: Option<f64>,
    pub humidity: f64,
    pub pressure: f64,
    pub altitude: f64,
    pub light_raw: i64,
    pub soil_moisture: f64,
    pub mq135_drop: f64,
    pub mq2_drop: f64,
    pub mq7_drop: f64,
    pub mq135_baseline: f64,
    pub mq2_baseline: f64,
    pub mq7_baseline: f64,
    pub flame_raw: f64,
    pub flame_detected: bool,
}

/// Canonical reading plus every computed and classified field.
///
/// Rebuilt from the cached [`CanonicalReading`] on every request; never
/// cached itself, since thresholds are user-editable and must apply live.
#[derive(Debug, Clone, Serialize)]
pub struct DerivedReading {
    // ---
    pub timestamp: f64,

    /// Average of the two temperature channels; single channel when only
    /// one reported; absent when neither did.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub temperature_status: BandStatus,
    pub temperature_color: &'static str,
    pub temperature_severity: Severity,

    pub humidity: f64,
    pub humidity_status: BandStatus,
    pub humidity_color: &'static str,
    pub humidity_severity: Severity,

    pub pressure: f64,
    pub altitude: f64,

    pub co2_level: f64,
    pub co2_status: Co2Status,
    pub co2_color: &'static str,
    pub co2_severity: Severity,

    /// Raw light intensity (0–4095), also exposed as `light_raw` for
    /// client compatibility.
    pub light: i64,
    pub light_raw: i64,
    pub light_status: LightStatus,
    pub light_color: &'static str,
    pub light_severity: Severity,

    pub soil_moisture: f64,
    pub soil_moisture_status: BandStatus,
    pub soil_moisture_color: &'static str,
    pub soil_moisture_severity: Severity,

    pub flame_detected: bool,
    pub flame_raw: f64,
    pub flame_status: FlameStatus,
    pub flame_color: &'static str,
    pub flame_severity: Severity,

    pub mq135_drop: f64,
    pub mq2_drop: f64,
    pub mq7_drop: f64,
    pub mq135_baseline: f64,
    pub mq2_baseline: f64,
    pub mq7_baseline: f64,

    pub air_quality: AirQualityStatus,
    pub air_quality_color: &'static str,
    pub air_quality_severity: Severity,

    pub flammable_gas: GasStatus,
    pub flammable_gas_color: &'static str,
    pub flammable_gas_severity: Severity,

    pub co_level: GasStatus,
    pub co_level_color: &'static str,
    pub co_level_severity: Severity,

    pub air_quality_combined: CombinedAirStatus,
    pub air_quality_combined_color: &'static str,
    pub air_quality_combined_severity: Severity,
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_status_severity_mapping() {
        // ---
        assert_eq!(BandStatus::Optimal.severity(), Severity::Optimal);
        assert_eq!(BandStatus::Acceptable.severity(), Severity::Warning);
        assert_eq!(BandStatus::Critical.severity(), Severity::Critical);
        assert_eq!(BandStatus::Unknown.severity(), Severity::Unknown);

        assert_eq!(GasStatus::Safe.severity(), Severity::Optimal);
        assert_eq!(GasStatus::Elevated.severity(), Severity::Warning);
        assert_eq!(GasStatus::High.severity(), Severity::Critical);

        assert_eq!(AirQualityStatus::Good.severity(), Severity::Optimal);
        assert_eq!(AirQualityStatus::Moderate.severity(), Severity::Warning);
        assert_eq!(AirQualityStatus::Poor.severity(), Severity::Critical);
    }

    #[test]
    fn test_dark_night_is_neutral_not_critical() {
        // ---
        // Darkness is the expected night state, not a fault.
        assert_eq!(LightStatus::DarkNight.severity(), Severity::Unknown);
        assert_eq!(LightStatus::LowLight.severity(), Severity::Unknown);
        assert_eq!(LightStatus::Bright.severity(), Severity::Optimal);
    }

    #[test]
    fn test_severity_color_tokens() {
        // ---
        assert_eq!(Severity::Optimal.color(), "#4CAF50");
        assert_eq!(Severity::Critical.color(), "#F44336");
        assert_ne!(Severity::Unknown.color(), Severity::Critical.color());
    }

    #[test]
    fn test_status_serialization_uses_display_names() {
        // ---
        let s = serde_json::to_string(&LightStatus::DarkNight).unwrap();
        assert_eq!(s, "\"Dark Night\"");

        let s = serde_json::to_string(&FlameStatus::NotDetected).unwrap();
        assert_eq!(s, "\"Flame Not Detected\"");

        let s = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(s, "\"warning\"");
    }

    #[test]
    fn test_canonical_reading_roundtrip() {
        // ---
        let reading = CanonicalReading {
            timestamp: 1_761_750_082.5,
            temperature_bmp280: Some(23.5),
            temperature_dht22: None,
            humidity: 55.0,
            pressure: 1013.2,
            altitude: 100.0,
            light_raw: 2000,
            soil_moisture: 45.0,
            mq135_drop: 150.0,
            mq2_drop: 0.0,
            mq7_drop: 10.0,
            mq135_baseline: 400.0,
            mq2_baseline: 500.0,
            mq7_baseline: 300.0,
            flame_raw: 4095.0,
            flame_detected: false,
        };

        let json = serde_json::to_string(&reading).unwrap();
        let back: CanonicalReading = serde_json::from_str(&json).unwrap();
        assert_eq!(back, reading);
        // Absent channel must not serialize as null.
        assert!(!json.contains("temperature_dht22"));
    }
}
