//! Per-sensor analysis endpoint.
//!
//! `GET /api/sensor-analysis/{sensor_type}?time_range=hours` maps a loose
//! sensor-type string from the client onto a canonical field, then returns
//! the current value, its classified status, and an ascending-timestamp
//! historical series drawn from the cached batch for charting. The series
//! is padded to at least two points so the client chart always has a line
//! to draw.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::models::CanonicalReading;
use crate::routes::sensor_data::NotReadyResponse;
use crate::routes::AppState;
use crate::thresholds::{ThresholdConfig, ThresholdStore};
use crate::{derive, timestamp};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/sensor-analysis/{sensor_type}", get(handler))
}

/// Query parameters for the analysis endpoint.
#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    time_range: Option<String>,
}

#[derive(Serialize)]
struct HistoryPoint {
    value: f64,
    timestamp: f64,
}

#[derive(Serialize)]
struct AnalysisResponse {
    sensor_type: String,
    current_value: Option<f64>,
    unit: &'static str,
    status: String,
    historical_data: Vec<HistoryPoint>,
    time_range: String,
    timestamp: f64,
}

/// Canonical sensor selector behind the loose client-facing type string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SensorKind {
    Temperature,
    Humidity,
    AirQuality,
    Co2,
    Light,
    SoilMoisture,
    Flame,
    FlammableGas,
    CarbonMonoxide,
    Pressure,
    Altitude,
}

impl SensorKind {
    /// Resolve the client's sensor-type string. Matching is substring
    /// based because the client sends display names ("Soil Moisture",
    /// "CO₂ / Air Quality", "MQ7"); unrecognized strings fall back to
    /// temperature, mirroring the client's default panel.
    fn parse(raw: &str) -> Self {
        // ---
        let s = raw.to_lowercase();
        if s.contains("temp") {
            SensorKind::Temperature
        } else if s.contains("humid") {
            SensorKind::Humidity
        } else if s.contains("mq135") || s.contains("air quality") || s.contains("air_quality") {
            SensorKind::AirQuality
        } else if s.contains("co2") {
            SensorKind::Co2
        } else if s.contains("light") {
            SensorKind::Light
        } else if s.contains("soil") {
            SensorKind::SoilMoisture
        } else if s.contains("flame") {
            SensorKind::Flame
        } else if s.contains("mq2") || s.contains("smoke") || s.contains("lpg") || s.contains("flammable") {
            SensorKind::FlammableGas
        } else if s.contains("mq7") || s.contains("carbon monoxide") || s.contains("co") {
            SensorKind::CarbonMonoxide
        } else if s.contains("pressure") {
            SensorKind::Pressure
        } else if s.contains("altitude") {
            SensorKind::Altitude
        } else {
            SensorKind::Temperature
        }
    }

    fn unit(&self) -> &'static str {
        // ---
        match self {
            SensorKind::Temperature => "C",
            SensorKind::Humidity | SensorKind::SoilMoisture => "%",
            SensorKind::AirQuality
            | SensorKind::Co2
            | SensorKind::FlammableGas
            | SensorKind::CarbonMonoxide => "ppm",
            SensorKind::Light => "lux",
            SensorKind::Flame => "",
            SensorKind::Pressure => "hPa",
            SensorKind::Altitude => "m",
        }
    }

    /// Extract this sensor's numeric value from a canonical reading.
    fn value(&self, reading: &CanonicalReading) -> Option<f64> {
        // ---
        match self {
            SensorKind::Temperature => derive::average_temperature(
                reading.temperature_bmp280,
                reading.temperature_dht22,
            ),
            SensorKind::Humidity => Some(reading.humidity),
            SensorKind::AirQuality => Some(reading.mq135_drop),
            SensorKind::Co2 => Some(derive::co2_level(reading.mq135_drop)),
            SensorKind::Light => Some(reading.light_raw as f64),
            SensorKind::SoilMoisture => Some(reading.soil_moisture),
            SensorKind::Flame => Some(if reading.flame_detected { 1.0 } else { 0.0 }),
            SensorKind::FlammableGas => Some(reading.mq2_drop),
            SensorKind::CarbonMonoxide => Some(reading.mq7_drop),
            SensorKind::Pressure => Some(reading.pressure),
            SensorKind::Altitude => Some(reading.altitude),
        }
    }

    /// Classified status label for the current value.
    fn status(&self, value: Option<f64>, config: &ThresholdConfig) -> String {
        // ---
        let Some(v) = value else {
            return "Unknown".to_string();
        };
        match self {
            SensorKind::Temperature => {
                status_label(derive::classify_band(v, &config.temperature))
            }
            SensorKind::Humidity => status_label(derive::classify_band(v, &config.humidity)),
            SensorKind::AirQuality => {
                status_label(derive::classify_air_quality(v, &config.mq135))
            }
            SensorKind::Co2 => status_label(derive::classify_co2(v, &config.co2)),
            SensorKind::Light => status_label(derive::classify_light(v.round() as i64)),
            SensorKind::SoilMoisture => {
                status_label(derive::classify_band(v, &config.soil_moisture))
            }
            SensorKind::Flame => {
                if v != 0.0 {
                    "Flame Detected".to_string()
                } else {
                    "Flame Not Detected".to_string()
                }
            }
            SensorKind::FlammableGas => status_label(derive::classify_gas(v, &config.mq2)),
            SensorKind::CarbonMonoxide => status_label(derive::classify_gas(v, &config.mq7)),
            // Fixed barometric band; not part of the editable config.
            SensorKind::Pressure => {
                if (990.0..=1030.0).contains(&v) {
                    "Normal".to_string()
                } else if v < 990.0 {
                    "Low".to_string()
                } else {
                    "High".to_string()
                }
            }
            SensorKind::Altitude => format!("{v:.1}m"),
        }
    }
}

/// Serialize a status enum to its display name.
fn status_label<T: Serialize>(status: T) -> String {
    // ---
    serde_json::to_value(status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string())
}

/// Number of historical points per requested time range bucket.
fn points_for_range(range: &str) -> usize {
    // ---
    match range {
        "seconds" | "minutes" => 60,
        "hours" => 24,
        "days" => 30,
        "weeks" => 52,
        "months" => 12,
        "years" => 5,
        _ => 30,
    }
}

async fn handler(
    Path(sensor_type): Path<String>,
    Query(params): Query<AnalysisQuery>,
    State((cache, config)): State<AppState>,
) -> impl IntoResponse {
    // ---
    let time_range = params.time_range.unwrap_or_else(|| "hours".to_string());
    let num_points = points_for_range(&time_range);

    let (batch, _status) = cache.read();
    if batch.is_empty() {
        info!("GET /api/sensor-analysis/{sensor_type} - cache empty, returning not-ready");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(NotReadyResponse::new())).into_response();
    }

    let kind = SensorKind::parse(&sensor_type);
    let thresholds = ThresholdStore::new(&config.thresholds_path).load();

    let current_value = kind.value(&batch[0]);
    let status = kind.status(current_value, &thresholds);

    // Charting series: oldest first, capped to the requested window.
    let mut historical_data: Vec<HistoryPoint> = batch
        .iter()
        .take(num_points)
        .map(|r| HistoryPoint {
            value: kind.value(r).unwrap_or(0.0),
            timestamp: r.timestamp,
        })
        .collect();
    historical_data.sort_by(|a, b| {
        a.timestamp
            .partial_cmp(&b.timestamp)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    // The client chart needs at least two points to draw a line.
    if historical_data.len() < 2 {
        let now = timestamp::now_epoch();
        let value = current_value.unwrap_or(0.0);
        historical_data = vec![
            HistoryPoint {
                value,
                timestamp: now - 10.0,
            },
            HistoryPoint {
                value,
                timestamp: now,
            },
        ];
    }

    info!(
        "GET /api/sensor-analysis/{} - kind={:?}, {} points",
        sensor_type,
        kind,
        historical_data.len()
    );

    (
        StatusCode::OK,
        Json(AnalysisResponse {
            sensor_type,
            current_value,
            unit: kind.unit(),
            status,
            historical_data,
            time_range,
            timestamp: batch[0].timestamp,
        }),
    )
        .into_response()
}
