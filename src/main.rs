//! Leafsight CLI
//!
//! Operator entry point for the mask-guided leaf disease detector: run a
//! prediction on an image file, list the known disease classes, or report
//! service readiness. The HTTP layer wrapping this core lives elsewhere;
//! this binary drives the same operations from the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use leafsight::backend;
use leafsight::inference::{DetectorConfig, LeafDetector};
use leafsight::utils::logging::{init_logging, LogConfig};

/// Mask-guided leaf disease classification
#[derive(Parser, Debug)]
#[command(name = "leafsight")]
#[command(version = leafsight::VERSION)]
#[command(about = "Leaf disease detection with a mask-guided classifier", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify a leaf image
    Predict {
        /// Path to the image file
        image: PathBuf,

        /// Path to the detector configuration (weight and class map locations)
        #[arg(short, long, default_value = "detector.json")]
        config: PathBuf,

        /// Emit the raw JSON result instead of formatted output
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// List the disease classes the detector knows
    Classes {
        /// Path to the detector configuration
        #[arg(short, long, default_value = "detector.json")]
        config: PathBuf,
    },

    /// Report readiness, device and class count
    Info {
        /// Path to the detector configuration
        #[arg(short, long, default_value = "detector.json")]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };
    init_logging(&log_config).map_err(|e| anyhow::anyhow!(e))?;

    match cli.command {
        Commands::Predict {
            image,
            config,
            json,
        } => predict(&image, &config, json),
        Commands::Classes { config } => classes(&config),
        Commands::Info { config } => info(&config),
    }
}

fn load_detector(config_path: &Path) -> Result<LeafDetector<backend::DefaultBackend>> {
    let config = DetectorConfig::load(config_path)
        .with_context(|| format!("failed to read detector config {:?}", config_path))?;
    let detector = LeafDetector::load(&config).context("failed to load detector")?;
    Ok(detector)
}

fn predict(image: &Path, config_path: &Path, json: bool) -> Result<()> {
    let detector = load_detector(config_path)?;

    let bytes = std::fs::read(image)
        .with_context(|| format!("failed to read image {:?}", image))?;
    let result = detector.predict(&bytes)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!(
        "{} {} ({:.2}%)",
        "Prediction:".green().bold(),
        result.prediction.bold(),
        result.confidence * 100.0
    );
    println!();
    println!("{}", "Top predictions:".cyan());
    for (i, score) in result.top_predictions.iter().enumerate() {
        println!("  {}. {} - {:.2}%", i + 1, score.name, score.confidence * 100.0);
    }

    Ok(())
}

fn classes(config_path: &Path) -> Result<()> {
    let detector = load_detector(config_path)?;
    let list = detector.list_classes();

    println!("{} {}", "Classes:".green().bold(), list.num_classes);
    for (i, name) in list.classes.iter().enumerate() {
        println!("  {:3}  {}", i, name);
    }

    Ok(())
}

fn info(config_path: &Path) -> Result<()> {
    let detector = load_detector(config_path)?;
    let health = detector.health();

    println!("{}", "Leafsight".green().bold());
    println!("  Version:     {}", leafsight::VERSION);
    println!("  Backend:     {}", backend::backend_name());
    println!("  Device:      {}", health.device);
    println!("  Classes:     {}", health.num_classes);
    println!("  Ready:       {}", health.ready);

    Ok(())
}
