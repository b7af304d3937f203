//! Pure payload normalization for raw OpenAQ payloads.
//!
//! Maps arbitrary parameter names and location strings onto the fixed
//! region/metric schema. The synonym tables are immutable configuration;
//! nothing mutates them at runtime.

use crate::types::{ClimateRow, PollutionRow};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashMap;

/// Pollutant parameter names accepted from source payloads, paired with the
/// canonical metric column they map to.
pub const POLLUTANT_PARAMS: &[(&str, &str)] = &[
    ("pm25", "pm25"),
    ("pm10", "pm10"),
    ("no2", "no2"),
    ("so2", "so2"),
    ("co", "co"),
    ("o3", "o3"),
];

/// Climate parameter synonyms accepted from source payloads, paired with the
/// canonical metric column they map to.
pub const CLIMATE_PARAMS: &[(&str, &str)] = &[
    ("temperature", "temperature"),
    ("temp", "temperature"),
    ("rh", "humidity"),
    ("humidity", "humidity"),
    ("ws", "wind_speed"),
    ("wind_speed", "wind_speed"),
    ("wd", "wind_direction"),
    ("wind_direction", "wind_direction"),
    ("precip", "precipitation"),
    ("precipitation", "precipitation"),
    ("pressure", "pressure"),
    ("press", "pressure"),
];

/// Canonical pollutant column for a source parameter name, if mapped.
pub fn canonical_pollutant(param: &str) -> Option<&'static str> {
    POLLUTANT_PARAMS
        .iter()
        .find(|(synonym, _)| *synonym == param)
        .map(|(_, canonical)| *canonical)
}

/// Canonical climate column for a source parameter name, if mapped.
pub fn canonical_climate(param: &str) -> Option<&'static str> {
    CLIMATE_PARAMS
        .iter()
        .find(|(synonym, _)| *synonym == param)
        .map(|(_, canonical)| *canonical)
}

/// Canonicalize a location name: trim, lowercase, collapse internal
/// whitespace to single spaces.
pub fn normalize_location_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Values pulled out of one raw payload, keyed by canonical column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedValues {
    /// Canonical pollutant values present in the payload
    pub pollution: HashMap<&'static str, f64>,
    /// Canonical climate values present in the payload
    pub climate: HashMap<&'static str, f64>,
    /// Latest measurement timestamp seen in the payload
    pub timestamp: Option<DateTime<Utc>>,
}

impl ExtractedValues {
    /// Build store rows for a region. Returns `None` for a side with no
    /// mapped values, so callers skip the insert entirely.
    pub fn into_rows(
        self,
        region_id: i64,
        fallback_ts: DateTime<Utc>,
    ) -> (Option<PollutionRow>, Option<ClimateRow>) {
        let timestamp = self.timestamp.unwrap_or(fallback_ts);

        let pollution = if self.pollution.is_empty() {
            None
        } else {
            Some(PollutionRow {
                region_id,
                timestamp,
                pm25: self.pollution.get("pm25").copied(),
                pm10: self.pollution.get("pm10").copied(),
                no2: self.pollution.get("no2").copied(),
                so2: self.pollution.get("so2").copied(),
                co: self.pollution.get("co").copied(),
                o3: self.pollution.get("o3").copied(),
                aqi: None,
            })
        };

        let climate = if self.climate.is_empty() {
            None
        } else {
            Some(ClimateRow {
                region_id,
                timestamp,
                temperature: self.climate.get("temperature").copied(),
                humidity: self.climate.get("humidity").copied(),
                wind_speed: self.climate.get("wind_speed").copied(),
                wind_direction: self.climate.get("wind_direction").copied(),
                precipitation: self.climate.get("precipitation").copied(),
                pressure: self.climate.get("pressure").copied(),
            })
        };

        (pollution, climate)
    }

    /// True when the payload yielded no mapped values on either side.
    pub fn is_empty(&self) -> bool {
        self.pollution.is_empty() && self.climate.is_empty()
    }
}

/// The entry object measurements are read from: the first element of a
/// non-empty top-level `results` array, otherwise the payload itself.
fn payload_entry(payload: &Value) -> Option<&Value> {
    match payload.get("results") {
        Some(Value::Array(results)) if !results.is_empty() => Some(&results[0]),
        _ => payload.is_object().then_some(payload),
    }
}

/// Extract the location display name from a raw payload, trying `city`,
/// `location`, then `name`.
pub fn extract_location_name(payload: &Value) -> Option<String> {
    let entry = payload_entry(payload)?;
    for key in ["city", "location", "name"] {
        if let Some(value) = entry.get(key).and_then(Value::as_str) {
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let text = value.as_str()?;
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn measurement_value(entry: &Value) -> Option<f64> {
    match entry.get("value")? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn measurement_parameter(entry: &Value) -> Option<String> {
    for key in ["parameter", "parameterId", "name"] {
        match entry.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return Some(s.to_lowercase()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            _ => {}
        }
    }
    None
}

/// Extract mapped measurements from a raw payload.
///
/// Measurements are read from `entry.measurements` or `entry.results`; each
/// measurement needs a parameter name and a numeric value. Unmapped
/// parameters are ignored. The extracted timestamp is the latest one seen
/// across measurements (`lastUpdated`, `last_updated`, or `date`).
pub fn extract_measurements(payload: &Value) -> ExtractedValues {
    let mut extracted = ExtractedValues::default();

    let Some(entry) = payload_entry(payload) else {
        return extracted;
    };

    let measurements = match (entry.get("measurements"), entry.get("results")) {
        (Some(Value::Array(list)), _) => list.as_slice(),
        (_, Some(Value::Array(list))) => list.as_slice(),
        _ => &[],
    };

    for m in measurements {
        if !m.is_object() {
            continue;
        }
        let Some(param) = measurement_parameter(m) else {
            continue;
        };
        let Some(value) = measurement_value(m) else {
            continue;
        };

        let candidate = ["lastUpdated", "last_updated", "date"]
            .iter()
            .filter_map(|key| m.get(key).and_then(parse_timestamp))
            .next();
        if let Some(ts) = candidate {
            if extracted.timestamp.is_none_or(|current| ts > current) {
                extracted.timestamp = Some(ts);
            }
        }

        if let Some(canonical) = canonical_pollutant(&param) {
            extracted.pollution.insert(canonical, value);
        } else if let Some(canonical) = canonical_climate(&param) {
            extracted.climate.insert(canonical, value);
        }
    }

    extracted
}
