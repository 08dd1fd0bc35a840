use std::sync::Arc;

use axum::Router;

use crate::cache::FreshnessCache;
use crate::Config;

mod alerts;
mod analysis;
mod health;
mod sensor_data;
mod thresholds;

// ---

/// Shared state for all routes: the read-only cache handle plus the
/// immutable configuration snapshot.
pub type AppState = (Arc<FreshnessCache>, Config);

pub fn router(cache: Arc<FreshnessCache>, config: Config) -> Router {
    // ---
    Router::new()
        .merge(sensor_data::router())
        .merge(alerts::router())
        .merge(analysis::router())
        .merge(thresholds::router())
        .merge(health::router())
        .with_state((cache, config))
}
