//! DermScan command line interface
//!
//! Subcommands:
//! - `prepare`: rename raw dataset images to the canonical scheme
//! - `train`: train a classifier and save a checkpoint
//! - `predict`: classify a single image with a trained checkpoint
//! - `stats`: show per-class image counts for both splits

use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;

use dermscan::backend::{backend_name, default_device, DefaultBackend, TrainingBackend};
use dermscan::dataset::{self, rename_dataset, SkinDataset, TEST_DIR, TRAIN_DIR};
use dermscan::training::{supervised, TrainingConfig};
use dermscan::utils::logging::init_logging;
use dermscan::Predictor;
use tracing::Level;

#[derive(Parser)]
#[command(name = "dermscan", version = dermscan::VERSION, about = "Skin lesion classification")]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Train a classifier on the dataset
    Train {
        /// Dataset root containing train/ and test/ splits
        #[arg(short, long, default_value = "data/skin")]
        data: PathBuf,

        /// Number of epochs
        #[arg(short, long, default_value = "10")]
        epochs: usize,

        /// Batch size
        #[arg(short, long, default_value = "32")]
        batch_size: usize,

        /// Adam learning rate
        #[arg(short, long, default_value = "0.0001")]
        learning_rate: f64,

        /// Adam weight decay
        #[arg(long, default_value = "0.0001")]
        weight_decay: f32,

        /// RNG seed for shuffling
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Output directory for checkpoints and summaries
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Checkpoint to fine-tune from
        #[arg(long)]
        pretrained: Option<PathBuf>,
    },

    /// Rename raw dataset images to the canonical naming scheme
    Prepare {
        /// Dataset root containing train/ and test/ splits
        #[arg(short, long, default_value = "data/skin")]
        data: PathBuf,
    },

    /// Classify a single image
    Predict {
        /// Trained model checkpoint
        #[arg(short, long)]
        model: PathBuf,

        /// Image to classify
        image: PathBuf,
    },

    /// Show dataset statistics
    Stats {
        /// Dataset root containing train/ and test/ splits
        #[arg(short, long, default_value = "data/skin")]
        data: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    if let Err(e) = init_logging(level) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    println!(
        "{} (backend: {})",
        "DermScan - Skin Lesion Classification".cyan().bold(),
        backend_name()
    );
    println!();

    let result = match cli.command {
        Command::Train {
            data,
            epochs,
            batch_size,
            learning_rate,
            weight_decay,
            seed,
            output,
            pretrained,
        } => {
            let config = TrainingConfig {
                epochs,
                batch_size,
                learning_rate,
                weight_decay,
                seed,
                output_dir: output.display().to_string(),
                ..Default::default()
            };
            cmd_train(&data, config, pretrained.as_deref())
        }
        Command::Prepare { data } => cmd_prepare(data),
        Command::Predict { model, image } => cmd_predict(model, image),
        Command::Stats { data } => cmd_stats(data),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn cmd_train(data: &Path, config: TrainingConfig, pretrained: Option<&Path>) -> Result<()> {
    let train_data = SkinDataset::from_dir(data.join(TRAIN_DIR))
        .context("Failed to load training split")?
        .with_image_size(config.image_size);
    let test_data = SkinDataset::from_dir(data.join(TEST_DIR))
        .context("Failed to load test split")?
        .with_image_size(config.image_size);

    let device = default_device();
    let summary =
        supervised::train::<TrainingBackend>(&config, &train_data, &test_data, pretrained, &device)?;

    println!(
        "{} {:.4}",
        "Final test macro F1:".green().bold(),
        summary.final_test_f1
    );
    Ok(())
}

fn cmd_prepare(data: PathBuf) -> Result<()> {
    if !data.is_dir() {
        anyhow::bail!("Dataset root not found: {}", data.display());
    }

    println!("Renaming images under {}", data.display());
    let stats = rename_dataset(&data)?;

    for class in &stats.per_class {
        println!("  {:<20} {:>6} renamed", class.class_dir, class.renamed);
    }
    println!();
    println!(
        "{} {} files renamed ({} class directories missing)",
        "Done:".green().bold(),
        stats.total_renamed,
        stats.missing_dirs
    );
    Ok(())
}

fn cmd_predict(model: PathBuf, image: PathBuf) -> Result<()> {
    let device = default_device();
    let predictor = Predictor::<DefaultBackend>::from_file(&model, device)
        .with_context(|| format!("Failed to load model {}", model.display()))?;

    let result = predictor.predict_path(&image)?;

    println!(
        "{} {} ({:.1}% confidence)",
        "Prediction:".green().bold(),
        result.class_name,
        result.confidence * 100.0
    );
    println!();
    for (class_idx, probability) in result.ranked() {
        println!(
            "  {:>10} {:>6.2}%",
            dataset::class_name(class_idx).unwrap_or("?"),
            probability * 100.0
        );
    }
    Ok(())
}

fn cmd_stats(data: PathBuf) -> Result<()> {
    for split in [TRAIN_DIR, TEST_DIR] {
        println!("{}", format!("{} split:", split).cyan().bold());
        match SkinDataset::from_dir(data.join(split)) {
            Ok(dataset) => dataset.stats().print(),
            Err(e) => println!("  {}", e),
        }
        println!();
    }
    Ok(())
}
