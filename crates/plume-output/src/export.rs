//! Export of run records as CSV or JSON.

use plume_data::types::{AttributionRecord, PredictionRecord};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during export operations.
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid format error.
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values format.
    Csv,

    /// Compact JSON format.
    Json,

    /// Pretty-printed JSON format.
    PrettyJson,
}

impl ExportFormat {
    /// Get the file extension for this format.
    pub const fn extension(&self) -> &str {
        match self {
            Self::Csv => "csv",
            Self::Json | Self::PrettyJson => "json",
        }
    }
}

/// Trait for exporting data in various formats.
pub trait Exporter {
    /// Export data to a string in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError>;

    /// Export data to a file in the specified format.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or file writing fails.
    fn export_to_file(&self, path: &Path, format: ExportFormat) -> Result<(), ExportError> {
        let content = self.export_to_string(format)?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }
}

fn csv_string<T: serde::Serialize>(records: &[T]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in records {
        wtr.serialize(record)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| ExportError::InvalidFormat(e.to_string()))
}

impl Exporter for Vec<PredictionRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

impl Exporter for Vec<AttributionRecord> {
    fn export_to_string(&self, format: ExportFormat) -> Result<String, ExportError> {
        match format {
            ExportFormat::Csv => csv_string(self),
            ExportFormat::Json => Ok(serde_json::to_string(self)?),
            ExportFormat::PrettyJson => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn sample_predictions() -> Vec<PredictionRecord> {
        let predicted_at = Utc.with_ymd_and_hms(2024, 6, 2, 12, 0, 0).unwrap();
        vec![
            PredictionRecord {
                id: Uuid::new_v4(),
                region_id: 1,
                prediction_timestamp: predicted_at,
                target_timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 6, 0, 0).unwrap(),
                predicted_aqi: 112.5,
                confidence_score: None,
                model_version: "rf-v1.0".to_string(),
            },
            PredictionRecord {
                id: Uuid::new_v4(),
                region_id: 2,
                prediction_timestamp: predicted_at,
                target_timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap(),
                predicted_aqi: 87.0,
                confidence_score: None,
                model_version: "rf-v1.0".to_string(),
            },
        ]
    }

    fn sample_attributions(predictions: &[PredictionRecord]) -> Vec<AttributionRecord> {
        predictions
            .iter()
            .map(|p| AttributionRecord {
                id: Uuid::new_v4(),
                prediction_id: p.id,
                feature_name: "pm25_lag_1".to_string(),
                feature_value: 40.0,
                contribution: 3.25,
            })
            .collect()
    }

    #[test]
    fn test_predictions_export_csv() {
        let predictions = sample_predictions();
        let csv = predictions.export_to_string(ExportFormat::Csv).unwrap();

        assert!(csv.starts_with("id,region_id,prediction_timestamp"));
        assert!(csv.contains("112.5"));
        assert!(csv.contains("rf-v1.0"));
        assert!(csv.contains(&predictions[0].id.to_string()));
        // two records plus the header
        assert_eq!(csv.trim_end().lines().count(), 3);
    }

    #[test]
    fn test_predictions_export_json() {
        let predictions = sample_predictions();
        let json = predictions.export_to_string(ExportFormat::Json).unwrap();

        assert!(json.contains("\"predicted_aqi\":112.5"));
        // the reserved column is serialized, just never populated
        assert!(json.contains("\"confidence_score\":null"));
    }

    #[test]
    fn test_attributions_export_csv() {
        let predictions = sample_predictions();
        let attributions = sample_attributions(&predictions);
        let csv = attributions.export_to_string(ExportFormat::Csv).unwrap();

        assert!(csv.starts_with("id,prediction_id,feature_name"));
        assert!(csv.contains("pm25_lag_1"));
        assert!(csv.contains(&predictions[0].id.to_string()));
    }

    #[test]
    fn test_pretty_json_is_indented() {
        let predictions = sample_predictions();
        let json = predictions
            .export_to_string(ExportFormat::PrettyJson)
            .unwrap();
        assert!(json.contains("  "));
    }

    #[test]
    fn test_export_to_file() {
        use std::io::Read;

        let predictions = sample_predictions();
        let path = std::env::temp_dir().join("plume_predictions_test.csv");

        predictions
            .export_to_file(&path, ExportFormat::Csv)
            .unwrap();
        let mut content = String::new();
        File::open(&path)
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert!(content.contains("rf-v1.0"));

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_export_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Json.extension(), "json");
        assert_eq!(ExportFormat::PrettyJson.extension(), "json");
    }
}
