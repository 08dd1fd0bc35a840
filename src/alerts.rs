//! Alert evaluation over a derived reading.
//!
//! Produces the ordered alert list served by `/api/alerts`. Safety-critical
//! checks (flame, carbon monoxide, flammable gas) are evaluated and
//! appended before environmental checks (temperature, humidity, air
//! quality), so list order reflects descending real-world urgency.
//!
//! Alerts read the same [`ThresholdConfig`] as display classification but
//! apply their own fixed rules; the two are intentionally independent so
//! alerting can be stricter than display status.

use serde::Serialize;
use uuid::Uuid;

use crate::models::DerivedReading;
use crate::thresholds::ThresholdConfig;

// ---

/// Alert urgency scale. Distinct from the display severity tiers: the
/// client keys notification sounds off this one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// One alert/recommendation record.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub timestamp: f64,
    pub sensor_type: &'static str,
    pub severity: AlertSeverity,
    pub value: f64,
    pub unit: &'static str,
    /// Whether the client should page/sound for this alert.
    pub sound: bool,
}

/// Alert count per severity step.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

/// Aggregate output of one evaluation pass.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    pub alerts: Vec<Alert>,
    pub timestamp: f64,
    pub alert_count: usize,
    pub severity_counts: SeverityCounts,
    /// True iff any generated alert carries the sound flag.
    pub should_alert: bool,
}

// ---

/// Evaluate a derived reading against the thresholds and build the
/// prioritized alert report.
pub fn evaluate(reading: &DerivedReading, config: &ThresholdConfig) -> AlertReport {
    // ---
    let mut alerts = Vec::new();
    let ts = reading.timestamp;

    // Safety-critical checks first.

    if reading.flame_detected {
        alerts.push(alert(
            ts,
            "Fire Hazard",
            "Flame or strong IR source detected. Inspect all heating equipment immediately!"
                .to_string(),
            "flame",
            AlertSeverity::Critical,
            reading.flame_raw,
            "raw",
            true,
        ));
    }

    let mq7 = reading.mq7_drop;
    if mq7 > config.mq7.high {
        alerts.push(alert(
            ts,
            "CO Critical",
            format!(
                "Carbon monoxide at {mq7:.0} ppm exceeds safe levels (>{:.0}). Ventilate immediately!",
                config.mq7.high
            ),
            "carbon_monoxide",
            AlertSeverity::Critical,
            mq7,
            "ppm",
            true,
        ));
    } else if mq7 > config.mq7.safe {
        alerts.push(alert(
            ts,
            "CO Elevated",
            format!("Carbon monoxide at {mq7:.0} ppm. Monitor heating equipment closely."),
            "carbon_monoxide",
            AlertSeverity::High,
            mq7,
            "ppm",
            true,
        ));
    }

    let mq2 = reading.mq2_drop;
    if mq2 > config.mq2.high {
        alerts.push(alert(
            ts,
            "Gas Critical",
            format!(
                "Flammable gas at {mq2:.0} ppm (>{:.0}). Check for leaks immediately!",
                config.mq2.high
            ),
            "flammable_gas",
            AlertSeverity::Critical,
            mq2,
            "ppm",
            true,
        ));
    } else if mq2 > config.mq2.safe {
        alerts.push(alert(
            ts,
            "Gas Elevated",
            format!("Flammable gas at {mq2:.0} ppm. Increase ventilation."),
            "flammable_gas",
            AlertSeverity::High,
            mq2,
            "ppm",
            true,
        ));
    }

    // Environmental checks. A reading with no temperature data emits no
    // temperature alert rather than alerting on a fabricated zero.

    if let Some(temp) = reading.temperature {
        let t = &config.temperature;
        if temp < t.acceptable_min {
            alerts.push(alert(
                ts,
                "Temperature Critical Low",
                format!(
                    "Temperature at {temp:.1} C is critically low (<{:.0} C). Plants may suffer cold damage.",
                    t.acceptable_min
                ),
                "temperature",
                AlertSeverity::High,
                temp,
                "C",
                true,
            ));
        } else if temp > t.acceptable_max {
            alerts.push(alert(
                ts,
                "Temperature Critical High",
                format!(
                    "Temperature at {temp:.1} C is dangerously high (>{:.0} C). Risk of heat stress.",
                    t.acceptable_max
                ),
                "temperature",
                AlertSeverity::High,
                temp,
                "C",
                true,
            ));
        } else if temp < t.optimal_min || temp > t.optimal_max {
            alerts.push(alert(
                ts,
                "Temperature Outside Optimal",
                format!(
                    "Temperature at {temp:.1} C is outside optimal range ({:.0}-{:.0} C).",
                    t.optimal_min, t.optimal_max
                ),
                "temperature",
                AlertSeverity::Medium,
                temp,
                "C",
                false,
            ));
        }
    }

    let humidity = reading.humidity;
    let h = &config.humidity;
    if humidity < h.optimal_min {
        alerts.push(alert(
            ts,
            "Humidity Critical Low",
            format!(
                "Humidity at {humidity:.0}% is critically low (<{:.0}%). Recommend shading to reduce evaporation.",
                h.optimal_min
            ),
            "humidity",
            AlertSeverity::High,
            humidity,
            "%",
            true,
        ));
    } else if humidity > h.acceptable_max {
        alerts.push(alert(
            ts,
            "Humidity Critical High",
            format!(
                "Humidity at {humidity:.0}% is dangerously high (>{:.0}%). Risk of fungal growth - run all ventilation!",
                h.acceptable_max
            ),
            "humidity",
            AlertSeverity::High,
            humidity,
            "%",
            true,
        ));
    } else if humidity > h.optimal_max {
        alerts.push(alert(
            ts,
            "Humidity Above Optimal",
            format!(
                "Humidity at {humidity:.0}% is outside optimal range ({:.0}-{:.0}%). Adjust vents/fans.",
                h.optimal_min, h.optimal_max
            ),
            "humidity",
            AlertSeverity::Medium,
            humidity,
            "%",
            false,
        ));
    }

    let mq135 = reading.mq135_drop;
    if mq135 > config.mq135.poor {
        alerts.push(alert(
            ts,
            "Air Quality Poor",
            format!(
                "Air quality at {mq135:.0} ppm indicates poor conditions (>{:.0}). Increase ventilation.",
                config.mq135.poor
            ),
            "air_quality",
            AlertSeverity::Medium,
            mq135,
            "ppm",
            true,
        ));
    } else if mq135 > config.mq135.good {
        alerts.push(alert(
            ts,
            "Air Quality Moderate",
            format!(
                "Air quality at {mq135:.0} ppm is outside optimal range (>{:.0}).",
                config.mq135.good
            ),
            "air_quality",
            AlertSeverity::Low,
            mq135,
            "ppm",
            false,
        ));
    }

    let mut severity_counts = SeverityCounts::default();
    for a in &alerts {
        match a.severity {
            AlertSeverity::Critical => severity_counts.critical += 1,
            AlertSeverity::High => severity_counts.high += 1,
            AlertSeverity::Medium => severity_counts.medium += 1,
            AlertSeverity::Low => severity_counts.low += 1,
        }
    }
    let should_alert = alerts.iter().any(|a| a.sound);

    AlertReport {
        alert_count: alerts.len(),
        timestamp: ts,
        severity_counts,
        should_alert,
        alerts,
    }
}

#[allow(clippy::too_many_arguments)]
fn alert(
    timestamp: f64,
    title: &str,
    message: String,
    sensor_type: &'static str,
    severity: AlertSeverity,
    value: f64,
    unit: &'static str,
    sound: bool,
) -> Alert {
    // ---
    Alert {
        id: Uuid::new_v4(),
        title: title.to_string(),
        message,
        timestamp,
        sensor_type,
        severity,
        value,
        unit,
        sound,
    }
}
