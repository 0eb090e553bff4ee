// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::fs;
use std::path::PathBuf;
use std::process;

use crate::cli::args::FinetuneArgs;
use crate::config::MiningConfig;
use crate::dataset::{Dataset, PoseSample};
use crate::finetune::{FineTuneRunner, find_next_run_dir};
use crate::model::OnnxPoseModel;
use crate::{download, error, info, success, verbose, warn};

/// Run fine-tuning over mined hard cases.
#[allow(clippy::too_many_lines)]
pub fn run_finetune(args: &FinetuneArgs) {
    // Resolve the model, downloading the default when missing
    let model_is_default = args.model.is_none();
    let model_path = args
        .model
        .clone()
        .unwrap_or_else(|| download::DEFAULT_MODEL.to_string());
    if model_is_default && args.verbose {
        warn!(
            "'model' argument is missing. Using default '--model={}'.",
            download::DEFAULT_MODEL
        );
    }
    let model_path = match download::ensure_model(&model_path) {
        Ok(p) => p,
        Err(e) => {
            error!("Error resolving model: {e}");
            process::exit(1);
        }
    };

    let config = MiningConfig::new()
        .with_input_size(args.imgsz)
        .with_batch_size(args.batch)
        .with_train_samples(args.train_samples)
        .with_val_samples(args.val_samples)
        .with_epochs(args.epochs)
        .with_proximity_threshold(args.threshold)
        .with_learning_rate(args.lr)
        .with_threads(args.threads);

    let mut model = match OnnxPoseModel::load(&model_path, &config) {
        Ok(m) => m,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };

    // Load and mine both splits
    let train_dataset = load_dataset(&args.annotations, &args.images);
    let val_dataset = load_dataset(&args.val_annotations, &args.val_images);

    let train: Vec<&PoseSample> = train_dataset
        .mine_hard_cases(config.proximity_threshold, Some(config.train_samples))
        .into_iter()
        .map(|(sample, _)| sample)
        .collect();
    let val: Vec<&PoseSample> = val_dataset
        .mine_hard_cases(config.proximity_threshold, Some(config.val_samples))
        .into_iter()
        .map(|(sample, _)| sample)
        .collect();

    info!(
        "Found {} training and {} validation images with crossed/occluded limbs",
        train.len(),
        val.len()
    );
    if train.is_empty() {
        error!("No hard cases found in the training corpus; nothing to fine-tune on");
        process::exit(1);
    }

    // Prepare the run directory
    let run_dir = PathBuf::from(find_next_run_dir(&args.output, "finetune"));
    if let Err(e) = fs::create_dir_all(&run_dir) {
        error!("Failed to create run directory '{}': {e}", run_dir.display());
        process::exit(1);
    }

    verbose!(
        "Fine-tuning on {} samples for {} epochs (batch {}, imgsz {}, lr {})",
        train.len(),
        config.epochs,
        config.batch_size,
        config.input_size,
        config.learning_rate
    );

    let mut runner = FineTuneRunner::new(&mut model, config);
    let history = match runner.run(&train, &val, |epoch, train_loss, val_loss| {
        info!(
            "Epoch {}/{} - loss: {train_loss:.6} - val_loss: {val_loss:.6}",
            epoch + 1,
            args.epochs
        );
    }) {
        Ok(h) => h,
        Err(e) => {
            error!("Fine-tuning failed: {e}");
            process::exit(1);
        }
    };

    // Write run outputs: loss history plus a checkpoint copy of the model
    let history_path = run_dir.join("loss_history.json");
    if let Err(e) = history.save(&history_path) {
        error!("Failed to write loss history: {e}");
        process::exit(1);
    }

    let checkpoint_path = run_dir.join("checkpoint.onnx");
    if let Err(e) = fs::copy(&model_path, &checkpoint_path) {
        error!("Failed to write checkpoint: {e}");
        process::exit(1);
    }

    success!("Results saved to '{}'", run_dir.display());
}

fn load_dataset(annotations: &str, images: &str) -> Dataset {
    match Dataset::load(annotations, images) {
        Ok(d) => {
            verbose!("Loaded {} images from '{annotations}'", d.len());
            if d.skipped_annotations() > 0 {
                warn!(
                    "Skipped {} malformed person annotation(s) in '{annotations}'",
                    d.skipped_annotations()
                );
            }
            d
        }
        Err(e) => {
            error!("Failed to load annotations '{annotations}': {e}");
            process::exit(1);
        }
    }
}
