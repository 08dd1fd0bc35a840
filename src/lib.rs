//! Library surface for the `greenhouse-telemetry` backend service.
//!
//! The binary in `main.rs` only handles startup (tracing, config, poller
//! spawn, listener bind); everything else lives here so the integration
//! tests can mount the same router against an in-process server.
//!
//! Pipeline modules, leaves first:
//! - `timestamp` – resolves a usable epoch-seconds value per raw record
//! - `normalize` – alias lookup, coercion, soil reconciliation, batch sort
//! - `thresholds` – typed threshold config with a file-backed override store
//! - `derive` – computed fields plus (status, color, severity) per quantity
//! - `cache` – lock-guarded latest-batch slot with freshness bucketing
//! - `poller` – background upstream refresh loop feeding the cache
//! - `alerts` – prioritized safety/environmental alert evaluation
//! - `routes` – Axum route gateway (EMBP pattern)

pub mod alerts;
pub mod cache;
pub mod config;
pub mod derive;
pub mod models;
pub mod normalize;
pub mod poller;
pub mod routes;
pub mod thresholds;
pub mod timestamp;

pub use config::Config;

// These are not used here but they are re-exported for routes/*.rs, that way
// refactoring is easier since routes/*.rs do not need knowledge of the leaf
// modules, only of the crate root.
pub use cache::{CacheStatus, FreshnessCache};
pub use models::{CanonicalReading, DerivedReading};
pub use thresholds::ThresholdConfig;
