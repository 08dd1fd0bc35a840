//! Pull-only diagnostic for the upstream sensor feed.
//!
//! Polls the primary GET endpoint at the configured interval, runs the
//! strict normalization path (records missing every required sensor field
//! are dropped and logged), and logs the latest reading's key values for
//! quick checks. Reads from the upstream only; nothing is published or
//! cached.
//!
//! Pass `--once` to fetch a single time and exit.

use std::time::Duration;

use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;

use greenhouse_telemetry::{config, normalize, poller};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .compact()
        .init();
    dotenv().ok();

    let cfg = config::load_from_env()?;
    let client = poller::build_client(&cfg)?;
    let once = std::env::args().any(|a| a == "--once");
    let interval = Duration::from_secs(u64::from(cfg.poll_interval_secs.max(1)));

    tracing::info!(
        "Pull-only check against {} (interval {}s)",
        cfg.sensor_api_url,
        interval.as_secs()
    );

    loop {
        match poller::fetch_items(&client, &cfg.sensor_api_url).await {
            Ok(items) => {
                let readings = normalize::canonicalize_batch_strict(&items, None);
                match readings.first() {
                    Some(latest) => {
                        tracing::info!("Fetched latest reading from upstream:");
                        tracing::info!("  Timestamp            : {:.3}", latest.timestamp);
                        tracing::info!("  Temperature (BMP280) : {:?} C", latest.temperature_bmp280);
                        tracing::info!("  Temperature (DHT22)  : {:?} C", latest.temperature_dht22);
                        tracing::info!("  Humidity             : {}%", latest.humidity);
                        tracing::info!("  Pressure             : {} hPa", latest.pressure);
                        tracing::info!("  Altitude             : {} m", latest.altitude);
                        tracing::info!("  Light                : {}", latest.light_raw);
                        tracing::info!("  MQ135 (Air Quality)  : {} ppm", latest.mq135_drop);
                        tracing::info!("  MQ2 (Flammable Gas)  : {} ppm", latest.mq2_drop);
                        tracing::info!("  MQ7 (CO)             : {} ppm", latest.mq7_drop);
                    }
                    None => {
                        tracing::warn!("upstream payload contained no valid readings");
                    }
                }
            }
            Err(e) => {
                tracing::error!("fetch failed: {e:#}");
            }
        }

        if once {
            break;
        }
        tokio::time::sleep(interval).await;
    }

    Ok(())
}
