//! Supervised training loop
//!
//! Each epoch runs one weight-update pass over the training split and
//! one gradient-free evaluation pass over the test split, then prints a
//! single summary line with loss and macro F1 for both. Gradients are
//! only tracked during the training pass; evaluation runs on the inner
//! backend via `model.valid()`.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use burn::data::dataloader::batcher::Batcher;
use burn::module::AutodiffModule;
use burn::nn::loss::CrossEntropyLossConfig;
use burn::optim::decay::WeightDecayConfig;
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::prelude::*;
use burn::record::CompactRecorder;
use burn::tensor::backend::AutodiffBackend;
use chrono::Local;
use colored::Colorize;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dataset::{SkinBatch, SkinBatcher, SkinDataset, CLASS_NAMES, NUM_CLASSES};
use crate::model::{SkinClassifier, SkinClassifierConfig};
use crate::training::TrainingConfig;
use crate::utils::format_duration;
use crate::utils::metrics::Metrics;

/// Loss and macro F1 for one epoch, on both splits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochRecord {
    pub epoch: usize,
    pub train_loss: f64,
    pub train_f1: f64,
    pub test_loss: f64,
    pub test_f1: f64,
}

/// Result of a full training run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    /// Per-epoch records, in order
    pub epochs: Vec<EpochRecord>,
    /// Macro F1 on the test split after the last epoch
    pub final_test_f1: f64,
    /// Accuracy on the test split after the last epoch
    pub final_test_accuracy: f64,
    /// Where the trained model was saved
    pub model_path: PathBuf,
}

/// Train a classifier for a fixed number of epochs.
///
/// When `pretrained` is given, the checkpoint is loaded first and its
/// classification head replaced to match the current label set.
pub fn train<B: AutodiffBackend>(
    config: &TrainingConfig,
    train_data: &SkinDataset,
    test_data: &SkinDataset,
    pretrained: Option<&Path>,
    device: &B::Device,
) -> Result<TrainingSummary> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid training config: {}", e))?;

    println!("{}", "Starting supervised training".green().bold());
    println!("Train split ({} images):", train_data.len());
    train_data.stats().print();
    println!("Test split ({} images):", test_data.len());
    test_data.stats().print();
    println!();

    let started = Instant::now();

    let model_config = SkinClassifierConfig::new();
    let mut model: SkinClassifier<B> = match pretrained {
        Some(path) => {
            let loaded = model_config
                .init::<B>(device)
                .load_file(path, &CompactRecorder::new(), device)
                .map_err(|e| anyhow::anyhow!("Failed to load pretrained model: {:?}", e))?;
            println!(
                "{} {}",
                "Loaded pretrained weights from".cyan(),
                path.display()
            );
            loaded.replace_head(NUM_CLASSES, device)
        }
        None => model_config.init::<B>(device),
    };

    let mut optim = AdamConfig::new()
        .with_weight_decay(Some(WeightDecayConfig::new(config.weight_decay)))
        .init::<B, SkinClassifier<B>>();

    let loss_fn = CrossEntropyLossConfig::new().init(device);
    let batcher = SkinBatcher::new(config.image_size);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

    let mut records = Vec::with_capacity(config.epochs);
    let mut last_test_metrics = Metrics::default();

    for epoch in 1..=config.epochs {
        // Weight-update pass over the training split
        let mut indices: Vec<usize> = (0..train_data.len()).collect();
        indices.shuffle(&mut rng);

        let mut loss_sum = 0.0;
        let mut seen = 0usize;
        let mut predictions = Vec::with_capacity(train_data.len());
        let mut targets = Vec::with_capacity(train_data.len());

        for (batch_idx, chunk) in indices.chunks(config.batch_size).enumerate() {
            let items: Vec<_> = chunk
                .iter()
                .filter_map(|&idx| match train_data.load_item(idx) {
                    Ok(item) => Some(item),
                    Err(e) => {
                        warn!("Skipping unreadable training image: {}", e);
                        None
                    }
                })
                .collect();

            if items.is_empty() {
                continue;
            }
            let batch_len = items.len();

            let batch: SkinBatch<B> = batcher.batch(items, device);
            let logits = model.forward(batch.images);
            let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

            let loss_value: f64 = loss.clone().into_scalar().elem();
            loss_sum += loss_value * batch_len as f64;
            seen += batch_len;
            debug!(epoch, batch_idx, loss = loss_value, "train batch");

            collect_predictions(logits, batch.targets, &mut predictions, &mut targets);

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optim.step(config.learning_rate, model, grads);
        }

        let train_loss = if seen > 0 { loss_sum / seen as f64 } else { 0.0 };
        let train_metrics = Metrics::from_predictions(&predictions, &targets, NUM_CLASSES);

        // Evaluation pass over the test split, gradients off
        let (test_loss, test_metrics) = evaluate::<B::InnerBackend>(
            &model.valid(),
            test_data,
            &batcher,
            config.batch_size,
            device,
        );

        let record = EpochRecord {
            epoch,
            train_loss,
            train_f1: train_metrics.macro_f1,
            test_loss,
            test_f1: test_metrics.macro_f1,
        };
        println!("{}", format_epoch_line(&record, config.epochs));

        records.push(record);
        last_test_metrics = test_metrics;
    }

    // Persist the model and run artifacts
    let output_dir = Path::new(&config.output_dir);
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    let model_name = format!("dermscan_{}", Local::now().format("%Y%m%d_%H%M%S"));
    let model_base = output_dir.join(&model_name);
    model
        .clone()
        .save_file(&model_base, &CompactRecorder::new())
        .map_err(|e| anyhow::anyhow!("Failed to save model: {:?}", e))?;
    let model_path = model_base.with_extension("mpk");

    config
        .save(output_dir.join(format!("{}_config.json", model_name)))
        .context("Failed to save training config")?;
    model_config
        .save(output_dir.join(format!("{}_model.json", model_name)))
        .context("Failed to save model config")?;

    let summary = TrainingSummary {
        epochs: records,
        final_test_f1: last_test_metrics.macro_f1,
        final_test_accuracy: last_test_metrics.accuracy,
        model_path: model_path.clone(),
    };

    let summary_json =
        serde_json::to_string_pretty(&summary).context("Failed to serialize training summary")?;
    std::fs::write(
        output_dir.join(format!("{}_summary.json", model_name)),
        summary_json,
    )
    .context("Failed to write training summary")?;

    println!();
    println!("{}", "Per-class F1 (test split):".bold());
    for class in &last_test_metrics.per_class {
        println!(
            "  {:>10}  F1 {:.4}  (support {})",
            CLASS_NAMES.get(class.class_idx).copied().unwrap_or("?"),
            class.f1,
            class.support
        );
    }
    println!(
        "{}",
        last_test_metrics.confusion_matrix.display(Some(&CLASS_NAMES[..]))
    );

    println!(
        "{} {} (took {})",
        "Model saved to".green(),
        model_path.display(),
        format_duration(started.elapsed())
    );

    Ok(summary)
}

/// Evaluate a model on a dataset, returning mean loss and metrics
pub fn evaluate<B: Backend>(
    model: &SkinClassifier<B>,
    data: &SkinDataset,
    batcher: &SkinBatcher,
    batch_size: usize,
    device: &B::Device,
) -> (f64, Metrics) {
    let loss_fn = CrossEntropyLossConfig::new().init(device);

    let mut loss_sum = 0.0;
    let mut seen = 0usize;
    let mut predictions = Vec::with_capacity(data.len());
    let mut targets = Vec::with_capacity(data.len());

    for start in (0..data.len()).step_by(batch_size.max(1)) {
        let end = (start + batch_size).min(data.len());
        let items: Vec<_> = (start..end)
            .filter_map(|idx| match data.load_item(idx) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Skipping unreadable image during evaluation: {}", e);
                    None
                }
            })
            .collect();

        if items.is_empty() {
            continue;
        }
        let batch_len = items.len();

        let batch: SkinBatch<B> = batcher.batch(items, device);
        let logits = model.forward(batch.images);
        let loss = loss_fn.forward(logits.clone(), batch.targets.clone());

        let loss_value: f64 = loss.into_scalar().elem();
        loss_sum += loss_value * batch_len as f64;
        seen += batch_len;

        collect_predictions(logits, batch.targets, &mut predictions, &mut targets);
    }

    let mean_loss = if seen > 0 { loss_sum / seen as f64 } else { 0.0 };
    let metrics = Metrics::from_predictions(&predictions, &targets, NUM_CLASSES);

    (mean_loss, metrics)
}

/// Format the per-epoch summary line
pub fn format_epoch_line(record: &EpochRecord, total_epochs: usize) -> String {
    format!(
        "Epoch {}/{} => Train loss: {:.4}, Train F1: {:.4}, Test loss: {:.4}, Test F1: {:.4}",
        record.epoch,
        total_epochs,
        record.train_loss,
        record.train_f1,
        record.test_loss,
        record.test_f1
    )
}

fn collect_predictions<B: Backend>(
    logits: Tensor<B, 2>,
    batch_targets: Tensor<B, 1, Int>,
    predictions: &mut Vec<usize>,
    targets: &mut Vec<usize>,
) {
    let predicted = logits.argmax(1).squeeze::<1>(1);

    let predicted_data = predicted.into_data();
    predictions.extend(predicted_data.iter::<i64>().map(|v| v as usize));

    let target_data = batch_targets.into_data();
    targets.extend(target_data.iter::<i64>().map(|v| v as usize));
}
