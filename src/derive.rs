//! Derivation engine: computed fields and threshold classification.
//!
//! Takes one [`CanonicalReading`] plus the current [`ThresholdConfig`] and
//! produces a fully classified [`DerivedReading`]. Runs on every request —
//! thresholds are user-editable and must apply live, so derived readings
//! are never cached.
//!
//! Classification is total: absent inputs produce the Unknown status with
//! the `unknown` severity tier, and a defective field never aborts
//! derivation of the rest of the reading.

use crate::models::{
    AirQualityStatus, BandStatus, CanonicalReading, Co2Status, CombinedAirStatus, DerivedReading,
    FlameStatus, GasStatus, LightStatus,
};
use crate::thresholds::{
    AirQualityThresholds, BandThresholds, Co2Thresholds, GasThresholds, ThresholdConfig,
};

// ---

/// Estimated CO2 concentration from the MQ135 drop.
///
/// Fixed linear calibration inherited from the deployed sensor rig; not a
/// physical law, and deliberately not configurable so historical readings
/// stay comparable.
pub fn co2_level(mq135_drop: f64) -> f64 {
    // ---
    let level = 400.0 + mq135_drop * 1.2;
    (level * 10.0).round() / 10.0
}

/// Average of the two temperature channels; single channel when only one
/// reported; absent when neither did.
pub fn average_temperature(bmp280: Option<f64>, dht22: Option<f64>) -> Option<f64> {
    // ---
    match (bmp280, dht22) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Optimal/acceptable/critical band classification.
pub fn classify_band(value: f64, bands: &BandThresholds) -> BandStatus {
    // ---
    if value >= bands.optimal_min && value <= bands.optimal_max {
        BandStatus::Optimal
    } else if value >= bands.acceptable_min && value <= bands.acceptable_max {
        BandStatus::Acceptable
    } else {
        BandStatus::Critical
    }
}

pub fn classify_temperature(value: Option<f64>, bands: &BandThresholds) -> BandStatus {
    // ---
    match value {
        Some(v) => classify_band(v, bands),
        None => BandStatus::Unknown,
    }
}

/// CO2 estimate classification. Values below the good band floor also
/// read as High: an estimate under ~300 ppm means the baseline is off,
/// not that the air is exceptionally clean.
pub fn classify_co2(value: f64, t: &Co2Thresholds) -> Co2Status {
    // ---
    if value >= t.good_min && value <= t.good_max {
        Co2Status::Good
    } else if value > t.good_max && value <= t.acceptable_max {
        Co2Status::Acceptable
    } else {
        Co2Status::High
    }
}

pub fn classify_air_quality(drop: f64, t: &AirQualityThresholds) -> AirQualityStatus {
    // ---
    if drop <= t.good {
        AirQualityStatus::Good
    } else if drop > t.poor {
        AirQualityStatus::Poor
    } else {
        AirQualityStatus::Moderate
    }
}

pub fn classify_gas(drop: f64, t: &GasThresholds) -> GasStatus {
    // ---
    if drop <= t.safe {
        GasStatus::Safe
    } else if drop > t.high {
        GasStatus::High
    } else {
        GasStatus::Elevated
    }
}

/// Ambient light bands over the raw 0–4095 intensity. Fixed, not
/// user-configurable.
pub fn classify_light(raw: i64) -> LightStatus {
    // ---
    if raw <= 300 {
        LightStatus::DarkNight
    } else if raw <= 819 {
        LightStatus::LowLight
    } else if raw <= 1638 {
        LightStatus::DimIndoor
    } else if raw <= 2457 {
        LightStatus::Moderate
    } else {
        LightStatus::Bright
    }
}

/// Combined judgment over the two correlated air readings, reporting the
/// worse of the MQ135 channel and the CO2 estimate.
pub fn combine_air_quality(aq: AirQualityStatus, co2: Co2Status) -> CombinedAirStatus {
    // ---
    match (aq, co2) {
        (AirQualityStatus::Poor, Co2Status::High) => CombinedAirStatus::Critical,
        (AirQualityStatus::Poor, _) | (_, Co2Status::High) => CombinedAirStatus::High,
        (AirQualityStatus::Moderate, _) | (_, Co2Status::Acceptable) => CombinedAirStatus::Moderate,
        (AirQualityStatus::Good, Co2Status::Good) => CombinedAirStatus::Optimal,
    }
}

// ---

/// Build the fully classified [`DerivedReading`] for one canonical
/// snapshot against the given thresholds.
pub fn derive(reading: &CanonicalReading, config: &ThresholdConfig) -> DerivedReading {
    // ---
    let temperature = average_temperature(reading.temperature_bmp280, reading.temperature_dht22);
    let temperature_status = classify_temperature(temperature, &config.temperature);

    let humidity_status = classify_band(reading.humidity, &config.humidity);
    let soil_moisture_status = classify_band(reading.soil_moisture, &config.soil_moisture);

    let co2_level = co2_level(reading.mq135_drop);
    let co2_status = classify_co2(co2_level, &config.co2);

    let light_status = classify_light(reading.light_raw);

    let air_quality = classify_air_quality(reading.mq135_drop, &config.mq135);
    let flammable_gas = classify_gas(reading.mq2_drop, &config.mq2);
    let co_level = classify_gas(reading.mq7_drop, &config.mq7);
    let air_quality_combined = combine_air_quality(air_quality, co2_status);

    let flame_status = if reading.flame_detected {
        FlameStatus::Detected
    } else {
        FlameStatus::NotDetected
    };

    DerivedReading {
        timestamp: reading.timestamp,

        temperature,
        temperature_status,
        temperature_color: temperature_status.severity().color(),
        temperature_severity: temperature_status.severity(),

        humidity: reading.humidity,
        humidity_status,
        humidity_color: humidity_status.severity().color(),
        humidity_severity: humidity_status.severity(),

        pressure: reading.pressure,
        altitude: reading.altitude,

        co2_level,
        co2_status,
        co2_color: co2_status.severity().color(),
        co2_severity: co2_status.severity(),

        light: reading.light_raw,
        light_raw: reading.light_raw,
        light_status,
        light_color: light_status.severity().color(),
        light_severity: light_status.severity(),

        soil_moisture: reading.soil_moisture,
        soil_moisture_status,
        soil_moisture_color: soil_moisture_status.severity().color(),
        soil_moisture_severity: soil_moisture_status.severity(),

        flame_detected: reading.flame_detected,
        flame_raw: reading.flame_raw,
        flame_status,
        flame_color: flame_status.severity().color(),
        flame_severity: flame_status.severity(),

        mq135_drop: reading.mq135_drop,
        mq2_drop: reading.mq2_drop,
        mq7_drop: reading.mq7_drop,
        mq135_baseline: reading.mq135_baseline,
        mq2_baseline: reading.mq2_baseline,
        mq7_baseline: reading.mq7_baseline,

        air_quality,
        air_quality_color: air_quality.severity().color(),
        air_quality_severity: air_quality.severity(),

        flammable_gas,
        flammable_gas_color: flammable_gas.severity().color(),
        flammable_gas_severity: flammable_gas.severity(),

        co_level,
        co_level_color: co_level.severity().color(),
        co_level_severity: co_level.severity(),

        air_quality_combined,
        air_quality_combined_color: air_quality_combined.severity().color(),
        air_quality_combined_severity: air_quality_combined.severity(),
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::Severity;

    fn test_reading() -> CanonicalReading {
        // ---
        CanonicalReading {
            timestamp: 1_761_750_082.0,
            temperature_bmp280: Some(23.5),
            temperature_dht22: Some(24.0),
            humidity: 55.0,
            pressure: 1013.2,
            altitude: 100.0,
            light_raw: 2000,
            soil_moisture: 50.0,
            mq135_drop: 150.0,
            mq2_drop: 250.0,
            mq7_drop: 200.0,
            mq135_baseline: 400.0,
            mq2_baseline: 500.0,
            mq7_baseline: 300.0,
            flame_raw: 4000.0,
            flame_detected: false,
        }
    }

    #[test]
    fn test_co2_linear_model() {
        // ---
        assert_eq!(co2_level(250.0), 700.0);
        assert_eq!(co2_level(0.0), 400.0);
    }

    #[test]
    fn test_temperature_average_and_status() {
        // ---
        assert_eq!(average_temperature(Some(23.5), Some(24.0)), Some(23.75));
        assert_eq!(average_temperature(Some(23.5), None), Some(23.5));
        assert_eq!(average_temperature(None, Some(24.0)), Some(24.0));
        assert_eq!(average_temperature(None, None), None);

        let config = ThresholdConfig::default();
        assert_eq!(
            classify_temperature(Some(23.75), &config.temperature),
            BandStatus::Optimal
        );
        assert_eq!(
            classify_temperature(None, &config.temperature),
            BandStatus::Unknown
        );
    }

    #[test]
    fn test_band_boundaries() {
        // ---
        let t = ThresholdConfig::default().temperature;
        assert_eq!(classify_band(20.0, &t), BandStatus::Optimal);
        assert_eq!(classify_band(27.0, &t), BandStatus::Optimal);
        assert_eq!(classify_band(19.9, &t), BandStatus::Acceptable);
        assert_eq!(classify_band(30.0, &t), BandStatus::Acceptable);
        assert_eq!(classify_band(17.9, &t), BandStatus::Critical);
        assert_eq!(classify_band(30.1, &t), BandStatus::Critical);

        // Humidity has no low acceptable side-band: below 45 is Critical.
        let h = ThresholdConfig::default().humidity;
        assert_eq!(classify_band(44.9, &h), BandStatus::Critical);
        assert_eq!(classify_band(75.0, &h), BandStatus::Acceptable);
    }

    #[test]
    fn test_gas_cutoffs() {
        // ---
        let g = ThresholdConfig::default().mq2;
        assert_eq!(classify_gas(300.0, &g), GasStatus::Safe);
        assert_eq!(classify_gas(300.1, &g), GasStatus::Elevated);
        assert_eq!(classify_gas(750.0, &g), GasStatus::Elevated);
        assert_eq!(classify_gas(750.1, &g), GasStatus::High);
    }

    #[test]
    fn test_air_quality_cutoffs() {
        // ---
        let a = ThresholdConfig::default().mq135;
        assert_eq!(classify_air_quality(200.0, &a), AirQualityStatus::Good);
        assert_eq!(classify_air_quality(200.1, &a), AirQualityStatus::Moderate);
        assert_eq!(classify_air_quality(500.0, &a), AirQualityStatus::Moderate);
        assert_eq!(classify_air_quality(500.1, &a), AirQualityStatus::Poor);
    }

    #[test]
    fn test_air_quality_respects_overridden_poor_cutoff() {
        // ---
        let overrides = serde_json::from_str(r#"{"mq135": {"poor": 400}}"#).unwrap();
        let config = ThresholdConfig::merged(&overrides);
        assert_eq!(
            classify_air_quality(450.0, &config.mq135),
            AirQualityStatus::Poor
        );
        // Other quantities keep default behavior.
        assert_eq!(classify_gas(450.0, &config.mq2), GasStatus::Elevated);
    }

    #[test]
    fn test_co2_status_bands() {
        // ---
        let c = ThresholdConfig::default().co2;
        assert_eq!(classify_co2(700.0, &c), Co2Status::Good);
        assert_eq!(classify_co2(1000.0, &c), Co2Status::Acceptable);
        assert_eq!(classify_co2(1600.0, &c), Co2Status::High);
        // An estimate below the good floor means a broken baseline.
        assert_eq!(classify_co2(250.0, &c), Co2Status::High);
    }

    #[test]
    fn test_light_fixed_bands() {
        // ---
        assert_eq!(classify_light(0), LightStatus::DarkNight);
        assert_eq!(classify_light(300), LightStatus::DarkNight);
        assert_eq!(classify_light(301), LightStatus::LowLight);
        assert_eq!(classify_light(819), LightStatus::LowLight);
        assert_eq!(classify_light(820), LightStatus::DimIndoor);
        assert_eq!(classify_light(1638), LightStatus::DimIndoor);
        assert_eq!(classify_light(1639), LightStatus::Moderate);
        assert_eq!(classify_light(2457), LightStatus::Moderate);
        assert_eq!(classify_light(2458), LightStatus::Bright);
        assert_eq!(classify_light(4095), LightStatus::Bright);
    }

    #[test]
    fn test_combined_air_quality_precedence() {
        // ---
        use AirQualityStatus as A;
        use Co2Status as C;
        assert_eq!(combine_air_quality(A::Poor, C::High), CombinedAirStatus::Critical);
        assert_eq!(combine_air_quality(A::Poor, C::Good), CombinedAirStatus::High);
        assert_eq!(combine_air_quality(A::Good, C::High), CombinedAirStatus::High);
        assert_eq!(combine_air_quality(A::Moderate, C::Good), CombinedAirStatus::Moderate);
        assert_eq!(combine_air_quality(A::Good, C::Acceptable), CombinedAirStatus::Moderate);
        assert_eq!(combine_air_quality(A::Good, C::Good), CombinedAirStatus::Optimal);
    }

    #[test]
    fn test_derive_full_reading() {
        // ---
        let derived = derive(&test_reading(), &ThresholdConfig::default());

        assert_eq!(derived.temperature, Some(23.75));
        assert_eq!(derived.temperature_status, BandStatus::Optimal);
        assert_eq!(derived.temperature_severity, Severity::Optimal);
        assert_eq!(derived.co2_level, 580.0); // 400 + 150 * 1.2
        assert_eq!(derived.air_quality, AirQualityStatus::Good);
        assert_eq!(derived.flammable_gas, GasStatus::Safe);
        assert_eq!(derived.co_level, GasStatus::Safe);
        assert_eq!(derived.light_status, LightStatus::Moderate);
        assert_eq!(derived.flame_status, FlameStatus::NotDetected);
        assert_eq!(derived.air_quality_combined, CombinedAirStatus::Optimal);
        assert_eq!(derived.temperature_color, Severity::Optimal.color());
    }

    #[test]
    fn test_derive_with_missing_temperature_is_unknown_not_zero() {
        // ---
        let mut reading = test_reading();
        reading.temperature_bmp280 = None;
        reading.temperature_dht22 = None;

        let derived = derive(&reading, &ThresholdConfig::default());
        assert_eq!(derived.temperature, None);
        assert_eq!(derived.temperature_status, BandStatus::Unknown);
        assert_eq!(derived.temperature_severity, Severity::Unknown);
        // The rest of the reading still derives normally.
        assert_eq!(derived.humidity_status, BandStatus::Optimal);
    }
}
