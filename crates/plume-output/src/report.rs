//! Training run summaries.

use chrono::{DateTime, Utc};
use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A feature ranked by how much it moved predictions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    /// Feature column name
    pub name: String,
    /// Mean absolute contribution across the evaluation rows
    pub mean_abs_contribution: f64,
}

/// Rank features by mean absolute contribution, largest first.
///
/// `contributions` is the [rows x features] matrix from attribution;
/// ties keep the original column order. Returns at most `limit` entries.
pub fn rank_features(
    feature_names: &[String],
    contributions: ArrayView2<'_, f64>,
    limit: usize,
) -> Vec<FeatureWeight> {
    let n_rows = contributions.nrows();
    if n_rows == 0 {
        return Vec::new();
    }

    let mut weights: Vec<FeatureWeight> = feature_names
        .iter()
        .zip(contributions.columns())
        .map(|(name, column)| FeatureWeight {
            name: name.clone(),
            mean_abs_contribution: column.iter().map(|v| v.abs()).sum::<f64>() / n_rows as f64,
        })
        .collect();
    weights.sort_by(|a, b| b.mean_abs_contribution.total_cmp(&a.mean_abs_contribution));
    weights.truncate(limit);
    weights
}

/// Summary of one completed training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// When the report was generated (UTC)
    pub generated_at: DateTime<Utc>,
    /// Version label of the trained model
    pub model_version: String,
    /// Observation rows loaded from the store
    pub loaded_rows: usize,
    /// Rows that survived feature construction
    pub matrix_rows: usize,
    /// Feature columns in the matrix
    pub n_features: usize,
    /// Rows the model trained on
    pub train_rows: usize,
    /// Held-out rows the model was scored on
    pub eval_rows: usize,
    /// Root mean squared error on the held-out rows
    pub rmse: f64,
    /// Mean absolute error on the held-out rows
    pub mae: f64,
    /// Ensemble base value the attributions start from
    pub base_value: f64,
    /// Features ranked by mean absolute contribution
    pub top_features: Vec<FeatureWeight>,
    /// Where the model artifact was written, when it was
    pub artifact_path: Option<String>,
}

impl RunReport {
    /// Convert the report to a pretty JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Training Run: {} ({})",
            self.model_version,
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        )?;
        writeln!(
            f,
            "  Rows: {} loaded -> {} usable -> {} train / {} eval",
            self.loaded_rows, self.matrix_rows, self.train_rows, self.eval_rows
        )?;
        writeln!(f, "  Features: {}", self.n_features)?;
        writeln!(f, "  RMSE: {:.3}", self.rmse)?;
        writeln!(f, "  MAE: {:.3}", self.mae)?;
        writeln!(f, "  Base value: {:.3}", self.base_value)?;
        if let Some(path) = &self.artifact_path {
            writeln!(f, "  Artifact: {path}")?;
        }
        if !self.top_features.is_empty() {
            writeln!(f, "  Top features by mean |contribution|:")?;
            for weight in &self.top_features {
                writeln!(
                    f,
                    "    {}: {:.4}",
                    weight.name, weight.mean_abs_contribution
                )?;
            }
        }
        // the split shuffles rows without regard to time, so eval rows can
        // share lagged history with training rows
        writeln!(
            f,
            "  Note: random row split; scores may be optimistic for forecasting"
        )?;
        Ok(())
    }
}
