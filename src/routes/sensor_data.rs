//! Latest-reading endpoint.
//!
//! `GET /api/sensor-data` serves the newest cached reading with all
//! derived fields, or an explicit 503 not-ready response when the poller
//! has never succeeded. Derivation runs per request against a freshly
//! loaded threshold config so user edits apply immediately; the handler
//! itself never fetches upstream data.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::derive;
use crate::models::DerivedReading;
use crate::routes::AppState;
use crate::thresholds::ThresholdStore;

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/sensor-data", get(handler))
}

#[derive(Serialize)]
struct SensorDataResponse {
    #[serde(flatten)]
    reading: DerivedReading,
    #[serde(rename = "_cache_status")]
    cache_status: String,
    #[serde(rename = "_data_source")]
    data_source: &'static str,
}

#[derive(Serialize)]
pub(super) struct NotReadyResponse {
    pub error: &'static str,
    pub message: &'static str,
    #[serde(rename = "_data_source")]
    pub data_source: &'static str,
}

impl NotReadyResponse {
    pub(super) fn new() -> Self {
        // ---
        Self {
            error: "sensor data not available yet",
            message: "Waiting for the first upstream poll to succeed. Please retry.",
            data_source: "none",
        }
    }
}

async fn handler(State((cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    let (batch, status) = cache.read();

    let Some(latest) = batch.first() else {
        info!("GET /api/sensor-data - cache empty, returning not-ready");
        return (StatusCode::SERVICE_UNAVAILABLE, Json(NotReadyResponse::new())).into_response();
    };

    let thresholds = ThresholdStore::new(&config.thresholds_path).load();
    let derived = derive::derive(latest, &thresholds);

    info!(
        "GET /api/sensor-data - serving reading at {:.0} ({})",
        derived.timestamp,
        status.label()
    );
    (
        StatusCode::OK,
        Json(SensorDataResponse {
            reading: derived,
            cache_status: status.label(),
            data_source: "upstream",
        }),
    )
        .into_response()
}
