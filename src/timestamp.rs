//! Timestamp resolution for raw upstream records.
//!
//! Upstream rows carry their capture time in whatever shape the source
//! happened to emit: a numeric epoch field, an ISO-8601 string under one of
//! several names (ORDS emits `timestamp_reading`, older firmware used
//! `timestamp_iso`), an Oracle-style `DD-MON-YYYY` string, or nothing at
//! all. This module runs the ordered fallback chain and stamps the winning
//! epoch-seconds value back into the record under `timestamp`, so every
//! record downstream of the resolver has a numeric capture time.
//!
//! The resolver never fails: when nothing parses it synthesizes
//! `now - index * 10` seconds, which keeps later rows in upstream return
//! order strictly older than earlier ones.

use chrono::{NaiveDateTime, Utc};
use serde_json::{Map, Value};

// ---

/// String timestamp fields, in lookup order. The primary source emits
/// `timestamp_reading`; the rest are legacy aliases.
const TIMESTAMP_FIELDS: &[&str] = &["timestamp_reading", "timestamp_iso", "timestamp"];

/// Parse formats, in attempt order: ISO-8601 with fractional seconds,
/// ISO-8601 without, Oracle `DD-MON-YYYY HH:MM:SS` (month abbreviation is
/// matched case-insensitively by chrono). All interpreted as UTC.
const PARSE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%d-%b-%Y %H:%M:%S"];

/// Seconds subtracted per batch position when synthesizing a timestamp.
const SYNTHETIC_STEP_SECS: f64 = 10.0;

/// Current wall-clock time as fractional epoch seconds.
pub fn now_epoch() -> f64 {
    // ---
    let now = Utc::now();
    now.timestamp() as f64 + f64::from(now.timestamp_subsec_micros()) * 1e-6
}

/// Resolve a usable epoch-seconds timestamp for one raw record and stamp it
/// back into the record under `timestamp`.
///
/// Ordered attempts, first success wins:
/// 1. An existing numeric `timestamp` field is used directly.
/// 2. Known string fields are tried against each parse format.
/// 3. A 10-digit epoch-looking substring embedded in a string field.
/// 4. Synthesis: `now - index * 10` seconds, logged as a warning.
///
/// `index` is the record's position in the upstream batch; synthetic
/// timestamps decrease with it so relative order survives.
pub fn resolve(record: &mut Map<String, Value>, index: usize) -> f64 {
    // ---
    if let Some(ts) = record.get("timestamp").and_then(Value::as_f64) {
        return ts;
    }

    for field in TIMESTAMP_FIELDS {
        let Some(raw) = record.get(*field).and_then(Value::as_str) else {
            continue;
        };
        if raw.trim().is_empty() {
            continue;
        }
        if let Some(ts) = parse_timestamp_str(raw) {
            stamp(record, ts);
            return ts;
        }
    }

    // No field parsed as a date; look for a bare epoch value buried in one
    // of the candidate strings.
    for field in TIMESTAMP_FIELDS {
        if let Some(raw) = record.get(*field).and_then(Value::as_str) {
            if let Some(ts) = find_embedded_epoch(raw) {
                stamp(record, ts);
                return ts;
            }
        }
    }

    let ts = now_epoch() - index as f64 * SYNTHETIC_STEP_SECS;
    tracing::warn!(
        "no parseable timestamp in record {}, synthesizing {:.3}",
        index,
        ts
    );
    stamp(record, ts);
    ts
}

/// Try every known format against a raw timestamp string.
///
/// Whitespace and embedded newlines are normalized first and a trailing
/// `Z` is stripped; the result is interpreted as UTC.
fn parse_timestamp_str(raw: &str) -> Option<f64> {
    // ---
    let cleaned: String = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = cleaned.trim_end_matches('Z');

    for format in PARSE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(cleaned, format) {
            return Some(to_epoch(dt));
        }
    }
    None
}

fn to_epoch(dt: NaiveDateTime) -> f64 {
    // ---
    let utc = dt.and_utc();
    utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_micros()) * 1e-6
}

/// Scan a string for a run of exactly 10 digits in the plausible epoch
/// range [1e9, 2e9), i.e. 2001-09 through 2033-05.
fn find_embedded_epoch(raw: &str) -> Option<f64> {
    // ---
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if !bytes[i].is_ascii_digit() {
            i += 1;
            continue;
        }
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i - start == 10 {
            if let Ok(value) = raw[start..i].parse::<u64>() {
                if (1_000_000_000..2_000_000_000).contains(&value) {
                    return Some(value as f64);
                }
            }
        }
    }
    None
}

fn stamp(record: &mut Map<String, Value>, ts: f64) {
    // ---
    if let Some(number) = serde_json::Number::from_f64(ts) {
        record.insert("timestamp".to_string(), Value::Number(number));
    }
}
