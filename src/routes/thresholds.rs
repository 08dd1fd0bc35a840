//! Threshold configuration endpoints.
//!
//! `GET /api/thresholds` returns the effective configuration (built-in
//! defaults with persisted overrides merged on top). `PUT /api/thresholds`
//! accepts a partial override document, persists it, and returns the new
//! effective configuration. Nothing caches the config, so an accepted edit
//! applies to the very next classification.

use axum::{
    extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router,
};
use tracing::{error, info};

use crate::routes::AppState;
use crate::thresholds::{ThresholdOverrides, ThresholdStore};

// ---

pub fn router() -> Router<AppState> {
    // ---
    Router::new().route("/api/thresholds", get(get_thresholds).put(put_thresholds))
}

async fn get_thresholds(State((_cache, config)): State<AppState>) -> impl IntoResponse {
    // ---
    let store = ThresholdStore::new(&config.thresholds_path);
    Json(store.load())
}

async fn put_thresholds(
    State((_cache, config)): State<AppState>,
    Json(overrides): Json<ThresholdOverrides>,
) -> impl IntoResponse {
    // ---
    let store = ThresholdStore::new(&config.thresholds_path);
    match store.save(&overrides) {
        Ok(()) => {
            info!("PUT /api/thresholds - overrides persisted");
            (StatusCode::OK, Json(store.load())).into_response()
        }
        Err(e) => {
            error!("Failed to persist thresholds: {e:#}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json("failed to persist thresholds"),
            )
                .into_response()
        }
    }
}
