//! The fixed feature column catalog.
//!
//! Column names and their order are part of the persisted contract: the
//! trained model, its explanations, and exported runs all reference features
//! by the names produced here. Training and evaluation always share one
//! column set.

use plume_data::MetricRecord;

/// Pollutant and climate columns in their stream order. The current value of
/// each is itself a feature.
pub const BASE_COLUMNS: [&str; 12] = [
    "pm25",
    "pm10",
    "no2",
    "so2",
    "co",
    "o3",
    "temperature",
    "humidity",
    "wind_speed",
    "wind_direction",
    "precipitation",
    "pressure",
];

/// Features derived from each record's timestamp alone.
pub const TEMPORAL_COLUMNS: [&str; 3] = ["hour", "day_of_week", "month"];

/// The regression target column.
pub const TARGET_COLUMN: &str = "aqi";

/// Columns lag and rolling features are built over: every base column plus
/// the target's own history.
pub const HISTORY_COLUMNS: [&str; 13] = [
    "pm25",
    "pm10",
    "no2",
    "so2",
    "co",
    "o3",
    "temperature",
    "humidity",
    "wind_speed",
    "wind_direction",
    "precipitation",
    "pressure",
    "aqi",
];

/// Name of the lag feature for a column at a given depth.
pub fn lag_feature_name(column: &str, lag: usize) -> String {
    format!("{column}_lag_{lag}")
}

/// Name of the rolling-mean feature for a column at a given window size.
pub fn rolling_feature_name(column: &str, window: usize) -> String {
    format!("{column}_roll_{window}")
}

/// The full ordered feature column list for a configuration: base columns,
/// temporal columns, then one lag block per depth and one rolling block per
/// window, each block spanning every history column.
pub fn feature_columns(lags: &[usize], windows: &[usize]) -> Vec<String> {
    let mut columns: Vec<String> = BASE_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    columns.extend(TEMPORAL_COLUMNS.iter().map(|c| (*c).to_string()));
    for lag in lags {
        for column in HISTORY_COLUMNS {
            columns.push(lag_feature_name(column, *lag));
        }
    }
    for window in windows {
        for column in HISTORY_COLUMNS {
            columns.push(rolling_feature_name(column, *window));
        }
    }
    columns
}

/// Value of the history column at `idx` (order of [`HISTORY_COLUMNS`]).
/// A missing target reads as NaN; out-of-range indices read as NaN and are
/// never produced by in-crate callers.
pub fn history_value(record: &MetricRecord, idx: usize) -> f64 {
    match idx {
        0 => record.pm25,
        1 => record.pm10,
        2 => record.no2,
        3 => record.so2,
        4 => record.co,
        5 => record.o3,
        6 => record.temperature,
        7 => record.humidity,
        8 => record.wind_speed,
        9 => record.wind_direction,
        10 => record.precipitation,
        11 => record.pressure,
        12 => record.aqi.unwrap_or(f64::NAN),
        _ => f64::NAN,
    }
}
