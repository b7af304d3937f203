//! Plume CLI binary.
//!
//! Provides the command-line interface for the Plume AQI pipeline.

mod integration;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::ingest::{IngestConfig, ingest_latest};
use integration::store_manager;
use integration::transform::{TransformConfig, transform_unprocessed};
use plume::pipeline::{TrainingOptions, run_training};
use plume::regions::{RegionRegistry, Zone};
use plume_data::DataStore;
use plume_data::openaq::OpenAqClient;
use plume_output::ExportFormat;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration as StdDuration;

#[derive(Parser)]
#[command(name = "plume")]
#[command(about = "Plume: AQI prediction and attribution pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite store path (defaults to the platform data directory)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch latest OpenAQ measurements into the raw ingest table
    Ingest {
        /// OpenAQ API key (or env OPENAQ_API_KEY)
        #[arg(long, env = "OPENAQ_API_KEY")]
        api_key: Option<String>,

        /// ISO country code to scan
        #[arg(long, default_value = "IN")]
        country: String,

        /// Locations page size
        #[arg(long, default_value = "100")]
        limit: u32,

        /// Maximum location pages to scan
        #[arg(long, default_value = "2")]
        pages: u32,
    },

    /// Normalize staged raw payloads into metric rows
    Transform {
        /// Raw rows fetched per batch
        #[arg(long, default_value = "50")]
        batch_size: usize,

        /// Leave rows staged when their region cannot be resolved
        #[arg(long)]
        keep_unmapped: bool,
    },

    /// Train the AQI model and persist predictions with attributions
    Train {
        /// Limit rows loaded for training
        #[arg(long)]
        max_rows: Option<usize>,

        /// Fraction of rows held out for evaluation
        #[arg(long, default_value = "0.2")]
        test_fraction: f64,

        /// Number of trees in the ensemble
        #[arg(long, default_value = "200")]
        trees: usize,

        /// Seed for the split and the per-tree bootstrap draws
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Model version label
        #[arg(long, default_value = "rf-v1.0")]
        model_version: String,

        /// Output path for the serialized model
        #[arg(long, default_value = "model.json")]
        model_path: PathBuf,

        /// Directory to export predictions and attributions into
        #[arg(long)]
        export: Option<PathBuf>,

        /// Export format (csv, json, or pretty-json)
        #[arg(long, default_value = "csv")]
        format: String,
    },

    /// List known regions with stored row counts
    Regions {
        /// Insert every registry region into the store first
        #[arg(long)]
        seed: bool,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let db_path = cli.db.unwrap_or_else(store_manager::default_store_path);

    match cli.command {
        Commands::Ingest {
            api_key,
            country,
            limit,
            pages,
        } => {
            let Some(api_key) = api_key else {
                eprintln!("Missing API key. Provide --api-key or set OPENAQ_API_KEY.");
                process::exit(2);
            };
            let config = IngestConfig {
                country,
                page_size: limit,
                max_pages: pages,
            };
            cmd_ingest(&db_path, api_key, &config).await?;
        }
        Commands::Transform {
            batch_size,
            keep_unmapped,
        } => {
            let config = TransformConfig {
                batch_size,
                keep_unmapped,
            };
            cmd_transform(&db_path, &config)?;
        }
        Commands::Train {
            max_rows,
            test_fraction,
            trees,
            seed,
            model_version,
            model_path,
            export,
            format,
        } => {
            let options = TrainingOptions {
                max_rows,
                test_fraction,
                n_trees: trees,
                seed,
                model_version,
                model_path: Some(model_path),
                export_dir: export,
                export_format: parse_format(&format)?,
                ..TrainingOptions::default()
            };
            cmd_train(&db_path, &options)?;
        }
        Commands::Regions { seed } => {
            cmd_regions(&db_path, seed)?;
        }
    }

    Ok(())
}

async fn cmd_ingest(
    db_path: &Path,
    api_key: String,
    config: &IngestConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db_path)?;
    let client = OpenAqClient::new(api_key)?;

    println!("Ingesting latest OpenAQ measurements ({})", config.country);
    println!("  Store: {}\n", db_path.display());

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message("Discovering locations...");

    let summary = match ingest_latest(&client, &store, config, Some(&pb)).await {
        Ok(s) => {
            pb.finish_with_message(format!("Staged {} payloads", s.stored));
            s
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(format!("Ingest failed: {}", e).into());
        }
    };

    println!("\n  Locations scanned: {}", summary.locations);
    println!("  Payloads staged:   {}", summary.stored);
    if summary.failed > 0 {
        println!("  Failed fetches:    {}", summary.failed);
    }
    println!(
        "\nIngested {} location payloads into the raw ingest table",
        summary.stored
    );

    Ok(())
}

fn cmd_transform(
    db_path: &Path,
    config: &TransformConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db_path)?;
    let registry = RegionRegistry::new();

    println!("  Store: {}", db_path.display());
    print!("Transforming staged payloads...");
    std::io::Write::flush(&mut std::io::stdout())?;

    let summary = match transform_unprocessed(&store, &registry, config) {
        Ok(s) => {
            println!(" ✓");
            s
        }
        Err(e) => {
            println!(" ✗");
            return Err(format!("Transform failed: {}", e).into());
        }
    };

    println!("\n  Raw rows processed: {}", summary.processed);
    println!("  Pollution rows:     {}", summary.pollution_rows);
    println!("  Climate rows:       {}", summary.climate_rows);
    if summary.unmapped > 0 {
        println!("  Unmapped (dropped): {}", summary.unmapped);
    }
    if summary.left_unprocessed > 0 {
        println!("  Left staged:        {}", summary.left_unprocessed);
    }

    Ok(())
}

fn cmd_train(db_path: &Path, options: &TrainingOptions) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db_path)?;

    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", "AQI MODEL TRAINING");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    println!("  Store: {}", db_path.display());
    println!(
        "  Model: bagged trees ({} trees, seed {})",
        options.n_trees, options.seed
    );
    println!(
        "  Split: {:.0}% of rows held out for evaluation",
        options.test_fraction * 100.0
    );
    println!();

    print!("Running training pipeline...");
    std::io::Write::flush(&mut std::io::stdout())?;
    let report = match run_training(&store, options) {
        Ok(r) => {
            println!(" ✓\n");
            r
        }
        Err(e) => {
            println!(" ✗");
            return Err(format!("Training failed: {}", e).into());
        }
    };

    print!("{}", report);
    if let Some(dir) = &options.export_dir {
        println!("  Exports: {}", dir.display());
    }

    Ok(())
}

fn cmd_regions(db_path: &Path, seed: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = store_manager::open_store(db_path)?;
    let registry = RegionRegistry::new();

    if seed {
        print!("Seeding {} known regions...", registry.size());
        std::io::Write::flush(&mut std::io::stdout())?;
        for name in registry.names() {
            store.upsert_region(&name)?;
        }
        println!(" ✓\n");
    }

    let summaries = store.region_summaries()?;
    if summaries.is_empty() {
        println!("No regions in the store yet. Seed the known set with: plume regions --seed");
        println!("\nKnown regions by zone:");
        let counts = registry.zone_counts();
        for zone in Zone::all() {
            let count = counts.get(&zone).unwrap_or(&0);
            println!("  {:15} {:3} regions", zone.name(), count);
        }
        return Ok(());
    }

    println!("Regions: {} in store, {} known\n", summaries.len(), registry.size());
    for summary in &summaries {
        let zone = registry.zone(&summary.name).map_or("-", |z| z.name());
        println!(
            "  {:22} {:>8} rows   {}",
            summary.name, summary.metric_rows, zone
        );
    }

    Ok(())
}

fn parse_format(name: &str) -> Result<ExportFormat, Box<dyn std::error::Error>> {
    let normalized = name.to_lowercase().replace('-', "");

    let format = match normalized.as_str() {
        "csv" => ExportFormat::Csv,
        "json" => ExportFormat::Json,
        "prettyjson" | "pretty" => ExportFormat::PrettyJson,
        _ => return Err(format!("Unknown export format: {}", name).into()),
    };

    Ok(format)
}
