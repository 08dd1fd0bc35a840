//! Reading normalization: raw upstream records to [`CanonicalReading`]s.
//!
//! Upstream rows arrive with arbitrary key casing (ORDS emits UPPERCASE),
//! values that may be numbers, numeric strings, booleans or null, and a
//! handful of competing names for the same concept. Everything funnels
//! through the alias tables and coercion helpers here so the rest of the
//! service only ever sees the canonical field set.
//!
//! Soil moisture is special: it can come from the primary record under any
//! of its aliases, or be merged in from the most recent reading of the
//! secondary soil source (see [`reconcile_soil`]). A failed secondary fetch
//! never blocks the primary batch.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::models::CanonicalReading;
use crate::timestamp;

// ---

/// Ordered soil-moisture aliases: canonical name first, then the names the
/// secondary source has used across firmware revisions.
pub const SOIL_ALIASES: &[&str] = &["soil_moisture", "moisture", "soil"];

/// Fields the pull-only diagnostic path expects a healthy record to carry.
/// A record missing every one of these is dropped by the strict path.
const REQUIRED_FIELDS: &[&str] = &[
    "timestamp",
    "temperature_bmp280",
    "temperature_dht22",
    "pressure",
    "altitude",
    "humidity",
];

/// Absent soil moisture defaults to a mid-range value rather than 0, which
/// would read as a critically dry bed.
const SOIL_MOISTURE_DEFAULT: f64 = 45.0;

/// Full scale of the light sensor ADC.
const LIGHT_RAW_MAX: f64 = 4095.0;

// ---

/// Lower-case all string keys of a raw record so alias lookup is
/// case-insensitive.
pub fn lowercase_keys(record: &Map<String, Value>) -> Map<String, Value> {
    // ---
    record
        .iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
        .collect()
}

/// Coerce a JSON value to `f64`: numbers directly, numeric strings parsed,
/// booleans as 0/1. Anything else is `None`.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    // ---
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn opt_num(record: &Map<String, Value>, key: &str) -> Option<f64> {
    // ---
    record.get(key).and_then(coerce_f64)
}

fn num(record: &Map<String, Value>, key: &str, default: f64) -> f64 {
    // ---
    opt_num(record, key).unwrap_or(default)
}

fn round1(value: f64) -> f64 {
    // ---
    (value * 10.0).round() / 10.0
}

/// True when at least one diagnostic required field is present. Applied to
/// the record before timestamp resolution (resolution always stamps
/// `timestamp`, which would make the check vacuous afterwards).
pub fn has_any_required_field(record: &Map<String, Value>) -> bool {
    // ---
    REQUIRED_FIELDS.iter().any(|f| record.contains_key(*f))
}

/// Merge the soil-moisture value from the most recent secondary-source
/// reading into the primary record, if the primary lacks one.
///
/// The value is written under both the canonical name and the legacy
/// `moisture` alias. Every other primary field is left untouched, and an
/// absent secondary reading is a no-op.
pub fn reconcile_soil(primary: &mut Map<String, Value>, secondary: Option<&Map<String, Value>>) {
    // ---
    if SOIL_ALIASES.iter().any(|k| primary.contains_key(*k)) {
        return;
    }
    let Some(secondary) = secondary else {
        return;
    };
    let Some(value) = SOIL_ALIASES.iter().find_map(|k| opt_num(secondary, k)) else {
        return;
    };
    if let Some(number) = serde_json::Number::from_f64(value) {
        primary.insert("soil_moisture".to_string(), Value::Number(number.clone()));
        primary.insert("moisture".to_string(), Value::Number(number));
    }
}

/// Normalize one raw record (any casing, any value types) into a
/// [`CanonicalReading`]. `index` is the record's batch position, used only
/// when a timestamp has to be synthesized.
pub fn canonicalize_record(record: &Map<String, Value>, index: usize) -> CanonicalReading {
    // ---
    let mut lowered = lowercase_keys(record);
    let ts = timestamp::resolve(&mut lowered, index);
    build_reading(&lowered, ts)
}

/// Normalize a batch for the serving path: every record is accepted
/// regardless of completeness, since partial data is still useful for
/// display. Output is sorted newest-first; index 0 is "latest".
pub fn canonicalize_batch(
    items: &[Map<String, Value>],
    soil: Option<&Map<String, Value>>,
) -> Vec<CanonicalReading> {
    // ---
    canonicalize_inner(items, soil, false)
}

/// Normalize a batch for the pull-only diagnostic path: records missing
/// every diagnostic required field are dropped and logged.
pub fn canonicalize_batch_strict(
    items: &[Map<String, Value>],
    soil: Option<&Map<String, Value>>,
) -> Vec<CanonicalReading> {
    // ---
    canonicalize_inner(items, soil, true)
}

fn canonicalize_inner(
    items: &[Map<String, Value>],
    soil: Option<&Map<String, Value>>,
    strict: bool,
) -> Vec<CanonicalReading> {
    // ---
    let mut readings = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let mut lowered = lowercase_keys(item);
        if strict && !has_any_required_field(&lowered) {
            tracing::warn!("dropping record {} with no recognized sensor fields", index);
            continue;
        }
        let ts = timestamp::resolve(&mut lowered, index);
        reconcile_soil(&mut lowered, soil);
        readings.push(build_reading(&lowered, ts));
    }

    readings.sort_by(|a, b| {
        b.timestamp
            .partial_cmp(&a.timestamp)
            .unwrap_or(Ordering::Equal)
    });
    readings
}

fn build_reading(record: &Map<String, Value>, timestamp: f64) -> CanonicalReading {
    // ---
    // Prefer the raw ADC intensity; fall back to scaling a percentage onto
    // the 0-4095 range; 0 when upstream omitted both.
    let light_raw = match opt_num(record, "light_raw") {
        Some(raw) => raw.round() as i64,
        None => match opt_num(record, "light_percent") {
            Some(pct) => (pct / 100.0 * LIGHT_RAW_MAX).round() as i64,
            None => 0,
        },
    };

    let soil_moisture = SOIL_ALIASES
        .iter()
        .find_map(|k| opt_num(record, k))
        .unwrap_or(SOIL_MOISTURE_DEFAULT)
        .round();

    let flame_raw = num(record, "flame_raw", 4095.0);

    CanonicalReading {
        timestamp,
        temperature_bmp280: opt_num(record, "temperature_bmp280"),
        temperature_dht22: opt_num(record, "temperature_dht22"),
        humidity: round1(num(record, "humidity", 0.0)),
        pressure: round1(num(record, "pressure", 0.0)),
        altitude: round1(num(record, "altitude", 0.0)),
        light_raw,
        soil_moisture,
        // A negative drop means the live reading exceeded the stored
        // baseline (sensor drift); reported as zero, never propagated.
        mq135_drop: round1(num(record, "mq135_drop", 0.0)).max(0.0),
        mq2_drop: round1(num(record, "mq2_drop", 0.0)).max(0.0),
        mq7_drop: round1(num(record, "mq7_drop", 0.0)).max(0.0),
        mq135_baseline: round1(num(record, "mq135_baseline", 0.0)),
        mq2_baseline: round1(num(record, "mq2_baseline", 0.0)),
        mq7_baseline: round1(num(record, "mq7_baseline", 0.0)),
        flame_raw,
        flame_detected: coerce_flame(record.get("flame_detected")),
    }
}

/// Reconcile the flame flag from its heterogeneous encodings: numeric
/// (nonzero = detected), boolean, or yes/true string forms. Anything else,
/// including an absent field, is "not detected".
fn coerce_flame(value: Option<&Value>) -> bool {
    // ---
    match value {
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => {
            matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "yes" | "y" | "true" | "1"
            )
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;

    fn record_from(value: serde_json::Value) -> Map<String, Value> {
        // ---
        value.as_object().expect("test record must be an object").clone()
    }

    fn full_record() -> Map<String, Value> {
        // ---
        record_from(json!({
            "timestamp": 1_761_750_082.0,
            "temperature_bmp280": 23.5,
            "temperature_dht22": 24.0,
            "humidity": 55.0,
            "pressure": 1013.25,
            "altitude": 100.04,
            "light_raw": 2000,
            "soil_moisture": 50,
            "mq135_drop": 150.0,
            "mq2_drop": 250.0,
            "mq7_drop": 200.0,
            "mq135_baseline": 400.0,
            "mq2_baseline": 500.0,
            "mq7_baseline": 300.0,
            "flame_raw": 4000,
            "flame_detected": 0,
        }))
    }

    #[test]
    fn test_key_lookup_is_case_insensitive() {
        // ---
        let record = record_from(json!({
            "TIMESTAMP": 1_761_750_082.0,
            "HUMIDITY": "55.5",
            "Mq135_Drop": 120.0,
        }));
        let reading = canonicalize_record(&record, 0);
        assert_eq!(reading.humidity, 55.5);
        assert_eq!(reading.mq135_drop, 120.0);
        assert_eq!(reading.timestamp, 1_761_750_082.0);
    }

    #[test]
    fn test_gas_drops_are_never_negative() {
        // ---
        for input in [-500.0, -12.3, -0.1, 0.0, 0.1, 640.0] {
            let record = record_from(json!({
                "timestamp": 1.0,
                "mq135_drop": input,
                "mq2_drop": input,
                "mq7_drop": input,
            }));
            let reading = canonicalize_record(&record, 0);
            assert!(reading.mq135_drop >= 0.0, "mq135 negative for {input}");
            assert!(reading.mq2_drop >= 0.0, "mq2 negative for {input}");
            assert!(reading.mq7_drop >= 0.0, "mq7 negative for {input}");
            if input > 0.0 {
                assert_eq!(reading.mq135_drop, input);
            }
        }
    }

    #[test]
    fn test_unparseable_numeric_falls_back_to_default() {
        // ---
        let record = record_from(json!({
            "timestamp": 1.0,
            "humidity": "not a number",
            "pressure": null,
        }));
        let reading = canonicalize_record(&record, 0);
        assert_eq!(reading.humidity, 0.0);
        assert_eq!(reading.pressure, 0.0);
    }

    #[test]
    fn test_light_prefers_raw_then_percent_then_zero() {
        // ---
        let raw = canonicalize_record(
            &record_from(json!({"timestamp": 1.0, "light_raw": 2458, "light_percent": 10.0})),
            0,
        );
        assert_eq!(raw.light_raw, 2458);

        let percent = canonicalize_record(
            &record_from(json!({"timestamp": 1.0, "light_percent": 50.0})),
            0,
        );
        assert_eq!(percent.light_raw, 2048); // 50% of 4095, rounded

        let neither = canonicalize_record(&record_from(json!({"timestamp": 1.0})), 0);
        assert_eq!(neither.light_raw, 0);
    }

    #[test]
    fn test_flame_heterogeneous_encodings() {
        // ---
        let detected: &[Value] = &[json!(1), json!(1.0), json!(true), json!("yes"), json!("Y"), json!("TRUE"), json!("1")];
        for v in detected {
            let record = record_from(json!({"timestamp": 1.0, "flame_detected": v}));
            assert!(canonicalize_record(&record, 0).flame_detected, "expected detected for {v}");
        }

        let not_detected: &[Value] =
            &[json!(0), json!(false), json!("no"), json!("0"), json!(null), json!([1])];
        for v in not_detected {
            let record = record_from(json!({"timestamp": 1.0, "flame_detected": v}));
            assert!(!canonicalize_record(&record, 0).flame_detected, "expected clear for {v}");
        }

        // Absent field is "not detected".
        let absent = record_from(json!({"timestamp": 1.0}));
        assert!(!canonicalize_record(&absent, 0).flame_detected);
    }

    #[test]
    fn test_soil_moisture_alias_chain() {
        // ---
        let canonical = canonicalize_record(
            &record_from(json!({"timestamp": 1.0, "soil_moisture": 61.0, "moisture": 10.0})),
            0,
        );
        assert_eq!(canonical.soil_moisture, 61.0);

        let legacy = canonicalize_record(
            &record_from(json!({"timestamp": 1.0, "moisture": 38.0})),
            0,
        );
        assert_eq!(legacy.soil_moisture, 38.0);

        let none = canonicalize_record(&record_from(json!({"timestamp": 1.0})), 0);
        assert_eq!(none.soil_moisture, 45.0);
    }

    #[test]
    fn test_temperature_channels_absent_stay_absent() {
        // ---
        let reading = canonicalize_record(&record_from(json!({"timestamp": 1.0})), 0);
        assert!(reading.temperature_bmp280.is_none());
        assert!(reading.temperature_dht22.is_none());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        // ---
        let first = canonicalize_record(&full_record(), 0);

        let reserialized = serde_json::to_value(&first).unwrap();
        let second = canonicalize_record(reserialized.as_object().unwrap(), 0);

        assert_eq!(first, second);
    }

    #[test]
    fn test_batch_sorted_newest_first() {
        // ---
        let items = vec![
            record_from(json!({"timestamp": 100.0, "humidity": 50.0})),
            record_from(json!({"timestamp": 300.0, "humidity": 52.0})),
            record_from(json!({"timestamp": 200.0, "humidity": 51.0})),
        ];
        let batch = canonicalize_batch(&items, None);
        assert_eq!(batch.len(), 3);
        assert!(batch[0].timestamp >= batch[1].timestamp);
        assert!(batch[1].timestamp >= batch[2].timestamp);
        assert_eq!(batch[0].timestamp, 300.0);
    }

    #[test]
    fn test_reconcile_copies_soil_from_secondary() {
        // ---
        let mut primary = record_from(json!({"timestamp": 1.0, "humidity": 50.0}));
        let secondary = record_from(json!({"moisture": 61.0}));
        reconcile_soil(&mut primary, Some(&secondary));

        assert_eq!(primary.get("soil_moisture").and_then(Value::as_f64), Some(61.0));
        assert_eq!(primary.get("moisture").and_then(Value::as_f64), Some(61.0));
        // Only the soil value is touched.
        assert_eq!(primary.get("humidity").and_then(Value::as_f64), Some(50.0));
    }

    #[test]
    fn test_reconcile_prefers_primary_soil_value() {
        // ---
        let mut primary = record_from(json!({"timestamp": 1.0, "soil_moisture": 40.0}));
        let secondary = record_from(json!({"soil_moisture": 61.0}));
        reconcile_soil(&mut primary, Some(&secondary));
        assert_eq!(primary.get("soil_moisture").and_then(Value::as_f64), Some(40.0));
    }

    #[test]
    fn test_reconcile_without_secondary_is_noop() {
        // ---
        let mut primary = record_from(json!({"timestamp": 1.0, "humidity": 50.0}));
        reconcile_soil(&mut primary, None);
        assert!(!primary.contains_key("soil_moisture"));
    }

    #[test]
    fn test_strict_path_drops_empty_records() {
        // ---
        let items = vec![
            record_from(json!({"label": "junk row"})),
            full_record(),
        ];
        let strict = canonicalize_batch_strict(&items, None);
        assert_eq!(strict.len(), 1);

        // The serving path keeps everything.
        let serving = canonicalize_batch(&items, None);
        assert_eq!(serving.len(), 2);
    }
}
