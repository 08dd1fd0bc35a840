//! Alert endpoint.
//!
//! `GET /api/alerts` evaluates the newest cached reading against the
//! current thresholds and returns the prioritized alert report. When no
//! reading has ever been cached the response is a 503 carrying empty
//! alert scaffolding, so the client's polling loop can keep its shape.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::routes::AppState;
use crate::thresholds::ThresholdStore;
use crate::{alerts, derive};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/alerts", get(handler))
}

async fn handler(State((cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    let (batch, _status) = cache.read();

    let Some(latest) = batch.first() else {
        info!("GET /api/alerts - cache empty, returning not-ready");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "error": "sensor data not available yet",
                "alerts": [],
                "alert_count": 0,
                "should_alert": false,
            })),
        )
            .into_response();
    };

    let thresholds = ThresholdStore::new(&config.thresholds_path).load();
    let derived = derive::derive(latest, &thresholds);
    let report = alerts::evaluate(&derived, &thresholds);

    info!(
        "GET /api/alerts - {} alerts, should_alert={}",
        report.alert_count, report.should_alert
    );
    (StatusCode::OK, Json(report)).into_response()
}
