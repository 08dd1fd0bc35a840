//! Background upstream poller feeding the freshness cache.
//!
//! One long-lived task owns the upstream refresh: fetch the primary batch,
//! best-effort fetch the secondary soil source, run the normalization
//! pipeline, then publish the result to the cache in a single swap. The
//! cache lock is never held across network I/O. On any failure the
//! previous batch is retained untouched — a transient upstream outage
//! degrades freshness, not availability.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use reqwest::Client;
use serde_json::{Map, Value};

use crate::cache::FreshnessCache;
use crate::models::CanonicalReading;
use crate::{normalize, timestamp, Config};

// ---

/// Run the refresh loop forever. Spawned once from `main`; there is no
/// cancellation contract other than process shutdown.
pub async fn run(cache: Arc<FreshnessCache>, config: Config) {
    // ---
    let client = match build_client(&config) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("failed to build upstream HTTP client, poller disabled: {e:#}");
            return;
        }
    };

    let interval = Duration::from_secs(u64::from(config.poll_interval_secs.max(1)));
    tracing::info!(
        "Starting upstream poller (url={}, interval={}s)",
        config.sensor_api_url,
        interval.as_secs()
    );

    loop {
        match poll_once(&client, &config).await {
            Ok(batch) if !batch.is_empty() => {
                tracing::debug!("poll successful, caching {} readings", batch.len());
                cache.refresh(batch);
            }
            Ok(_) => {
                tracing::warn!("upstream returned no records, keeping previous batch");
            }
            Err(e) => {
                tracing::warn!("upstream poll failed, keeping previous batch: {e:#}");
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Build the shared upstream client with the configured timeout.
pub fn build_client(config: &Config) -> Result<Client> {
    // ---
    Ok(Client::builder()
        .timeout(Duration::from_secs(u64::from(config.fetch_timeout_secs)))
        .build()?)
}

/// One full refresh cycle: primary fetch, best-effort soil fetch, pipeline.
/// Output is the normalized batch sorted newest-first.
pub async fn poll_once(client: &Client, config: &Config) -> Result<Vec<CanonicalReading>> {
    // ---
    let items = fetch_items(client, &config.sensor_api_url).await?;

    // The soil source may fail independently; that never blocks the
    // primary batch.
    let soil = match &config.soil_api_url {
        Some(url) => fetch_latest_soil(client, url).await,
        None => None,
    };

    Ok(normalize::canonicalize_batch(&items, soil.as_ref()))
}

/// GET one upstream endpoint and reduce the payload to a list of record
/// objects.
pub async fn fetch_items(client: &Client, url: &str) -> Result<Vec<Map<String, Value>>> {
    // ---
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        bail!("upstream {url} returned HTTP {status}");
    }
    let body: Value = response.json().await?;
    shape_items(body)
}

/// Accepted top-level payload shapes: a single object, a bare array of
/// objects, or an object with an `items` array (ORDS collections). Any
/// other shape is a fetch failure for this cycle.
pub fn shape_items(body: Value) -> Result<Vec<Map<String, Value>>> {
    // ---
    let candidates = match body {
        Value::Object(map) => {
            if let Some(Value::Array(items)) = map.get("items") {
                items.clone()
            } else {
                // Single-record payload: wrap it.
                return Ok(vec![map]);
            }
        }
        Value::Array(items) => items,
        other => bail!("unexpected top-level payload shape: {}", type_name(&other)),
    };

    let mut records = Vec::with_capacity(candidates.len());
    for (i, item) in candidates.into_iter().enumerate() {
        match item {
            Value::Object(map) => records.push(map),
            other => {
                tracing::debug!("skipping non-object item {} ({})", i, type_name(&other));
            }
        }
    }
    Ok(records)
}

/// Fetch the secondary soil source and pick its most recent record by
/// resolved timestamp. Errors are logged and swallowed.
async fn fetch_latest_soil(client: &Client, url: &str) -> Option<Map<String, Value>> {
    // ---
    let items = match fetch_items(client, url).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!("soil source fetch failed: {e:#}");
            return None;
        }
    };

    let mut latest: Option<(f64, Map<String, Value>)> = None;
    for (index, item) in items.iter().enumerate() {
        let mut lowered = normalize::lowercase_keys(item);
        let ts = timestamp::resolve(&mut lowered, index);
        if latest.as_ref().map_or(true, |(best, _)| ts > *best) {
            latest = Some((ts, lowered));
        }
    }
    latest.map(|(_, record)| record)
}

fn type_name(value: &Value) -> &'static str {
    // ---
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
