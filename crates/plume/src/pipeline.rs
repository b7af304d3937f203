//! End-to-end training pipeline orchestration.
//!
//! [`run_training`] executes one batch run as a single sequential control
//! flow: load the observation stream, build the feature matrix, train and
//! score the ensemble, attribute every evaluation prediction, persist the
//! aligned records, and write the model artifact. Every failure is tagged
//! with the stage it came from so the caller can say where a run died.

use chrono::Utc;
use plume_data::error::DataError;
use plume_data::store::DataStore;
use plume_data::types::ModelRunMeta;
use plume_features::{FeatureBuilder, FeatureConfig, FeatureError, RowKey};
use plume_model::{ForestConfig, ModelTrainer, SplitConfig, TrainingError};
use plume_output::align::{AlignmentError, ResultAligner};
use plume_output::export::{ExportError, ExportFormat, Exporter};
use plume_output::report::{RunReport, rank_features};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

/// How many features the run report ranks by mean absolute contribution.
const TOP_FEATURE_COUNT: usize = 10;

/// Errors from a pipeline run, tagged with the stage that failed.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading the training stream from the store failed.
    #[error("load stage: {0}")]
    Load(#[source] DataError),

    /// The store returned no training rows.
    #[error("load stage: no training rows in the store")]
    NoTrainingData,

    /// Feature construction failed.
    #[error("feature stage: {0}")]
    Features(#[from] FeatureError),

    /// Partitioning, fitting, scoring, or attribution failed.
    #[error("training stage: {0}")]
    Training(#[from] TrainingError),

    /// Packaging predictions and attributions failed.
    #[error("alignment stage: {0}")]
    Alignment(#[from] AlignmentError),

    /// Persisting run results to the store failed.
    #[error("persist stage: {0}")]
    Persist(#[source] DataError),

    /// Writing prediction or attribution exports failed.
    #[error("export stage: {0}")]
    Export(#[from] ExportError),

    /// The model artifact could not be serialized.
    #[error("artifact stage: {0}")]
    ArtifactEncode(#[from] serde_json::Error),

    /// The model artifact could not be written to disk.
    #[error("artifact stage: {0}")]
    ArtifactWrite(#[from] std::io::Error),
}

impl PipelineError {
    /// The name of the stage that produced this error.
    pub const fn stage(&self) -> &'static str {
        match self {
            Self::Load(_) | Self::NoTrainingData => "load",
            Self::Features(_) => "feature",
            Self::Training(_) => "training",
            Self::Alignment(_) => "alignment",
            Self::Persist(_) => "persist",
            Self::Export(_) => "export",
            Self::ArtifactEncode(_) | Self::ArtifactWrite(_) => "artifact",
        }
    }
}

/// Controls for one training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    /// Cap on rows loaded from the store; `None` loads everything
    pub max_rows: Option<usize>,
    /// Lag depths, in records, for the history features
    pub lags: Vec<usize>,
    /// Trailing window sizes, in records, for the rolling means
    pub windows: Vec<usize>,
    /// Fraction of matrix rows held out for evaluation
    pub test_fraction: f64,
    /// Number of trees in the ensemble
    pub n_trees: usize,
    /// Seed for the partition shuffle and the bootstrap draws
    pub seed: u64,
    /// Version label stamped on every prediction and the run record
    pub model_version: String,
    /// Where to write the serialized model; `None` skips the artifact
    pub model_path: Option<PathBuf>,
    /// Directory for prediction and attribution exports; `None` skips them
    pub export_dir: Option<PathBuf>,
    /// File format for the exports
    pub export_format: ExportFormat,
}

impl Default for TrainingOptions {
    fn default() -> Self {
        let features = FeatureConfig::default();
        Self {
            max_rows: None,
            lags: features.lags,
            windows: features.windows,
            test_fraction: 0.2,
            n_trees: 200,
            seed: 42,
            model_version: "rf-v1.0".to_string(),
            model_path: None,
            export_dir: None,
            export_format: ExportFormat::Csv,
        }
    }
}

/// Execute one full training run against the store.
///
/// Returns a [`RunReport`] summarizing row counts at each stage, the
/// evaluation metrics, the attribution base value, and the top features.
/// Predictions and their attributions land in the store atomically before
/// the artifact is written; run metadata is recorded last.
pub fn run_training(
    store: &dyn DataStore,
    options: &TrainingOptions,
) -> Result<RunReport, PipelineError> {
    let records = store
        .training_records(options.max_rows)
        .map_err(PipelineError::Load)?;
    if records.is_empty() {
        return Err(PipelineError::NoTrainingData);
    }
    let loaded_rows = records.len();

    let builder = FeatureBuilder::new(FeatureConfig {
        lags: options.lags.clone(),
        windows: options.windows.clone(),
    })?;
    let matrix = builder.build(&records)?;

    let trainer = ModelTrainer::new(
        SplitConfig {
            test_fraction: options.test_fraction,
            seed: options.seed,
        },
        ForestConfig {
            n_trees: options.n_trees,
            seed: options.seed,
            ..ForestConfig::default()
        },
    )?;
    let outcome = trainer.train(&matrix)?;

    let eval_keys: Vec<RowKey> = outcome
        .split
        .eval_indices
        .iter()
        .map(|&idx| matrix.keys()[idx])
        .collect();
    let trained_at = Utc::now();

    let aligner = ResultAligner::new(options.model_version.clone());
    let run = aligner.align(
        &eval_keys,
        outcome.predictions.view(),
        matrix.feature_names(),
        outcome.split.eval_features.view(),
        outcome.attributions.contributions().view(),
        trained_at,
    )?;

    store
        .put_run(&run.predictions, &run.attributions)
        .map_err(PipelineError::Persist)?;

    if let Some(dir) = &options.export_dir {
        fs::create_dir_all(dir).map_err(ExportError::from)?;
        let ext = options.export_format.extension();
        run.predictions
            .export_to_file(&dir.join(format!("predictions.{ext}")), options.export_format)?;
        run.attributions
            .export_to_file(&dir.join(format!("attributions.{ext}")), options.export_format)?;
    }

    let artifact_path = match &options.model_path {
        Some(path) => {
            let encoded = serde_json::to_string_pretty(&outcome.model)?;
            fs::write(path, encoded)?;
            Some(path.display().to_string())
        }
        None => None,
    };

    store
        .put_model_run(&ModelRunMeta {
            model_version: options.model_version.clone(),
            trained_at,
            rmse: outcome.rmse,
            mae: outcome.mae,
            artifact_path: artifact_path.clone().unwrap_or_default(),
        })
        .map_err(PipelineError::Persist)?;

    Ok(RunReport {
        generated_at: trained_at,
        model_version: options.model_version.clone(),
        loaded_rows,
        matrix_rows: matrix.n_rows(),
        n_features: matrix.n_features(),
        train_rows: outcome.split.n_train(),
        eval_rows: outcome.split.n_eval(),
        rmse: outcome.rmse,
        mae: outcome.mae,
        base_value: outcome.attributions.base_value(),
        top_features: rank_features(
            matrix.feature_names(),
            outcome.attributions.contributions().view(),
            TOP_FEATURE_COUNT,
        ),
        artifact_path,
    })
}
