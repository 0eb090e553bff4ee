// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Fine-tuning epoch driver.
//!
//! Streams mined hard-case samples through the pose model in batches and
//! accounts the masked keypoint loss per epoch. Weight updates are owned by
//! the external training backend; this driver owns the forward passes, loss
//! pooling, and the run outputs (loss history plus a checkpoint copy).

use std::fs;
use std::path::Path;

use rayon::prelude::*;
use serde::Serialize;

use crate::batch::{Batch, SampleBatcher};
use crate::config::MiningConfig;
use crate::dataset::PoseSample;
use crate::error::{MiningError, Result};
use crate::keypoints::Keypoints;
use crate::loss::masked_loss_components;
use crate::model::PoseModel;
use crate::preprocessing::preprocess_image;

/// Per-epoch training and validation loss history.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LossHistory {
    /// Pooled masked loss over the training split, one entry per epoch.
    pub train: Vec<f32>,
    /// Pooled masked loss over the validation split, one entry per epoch.
    pub val: Vec<f32>,
}

impl LossHistory {
    /// Write the history as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

/// Find the next available run directory (e.g. `runs/finetune`,
/// `runs/finetune2`, ...).
#[must_use]
pub fn find_next_run_dir(base: &str, prefix: &str) -> String {
    let base_path = Path::new(base);

    // First try without number
    let first = base_path.join(prefix);
    if !first.exists() {
        return first.to_string_lossy().to_string();
    }

    // Try with incrementing numbers
    for i in 2.. {
        let numbered = base_path.join(format!("{prefix}{i}"));
        if !numbered.exists() {
            return numbered.to_string_lossy().to_string();
        }
    }

    // Fallback (should never reach here)
    base_path.join(prefix).to_string_lossy().to_string()
}

/// Epoch driver over a pose model.
pub struct FineTuneRunner<'a, M: PoseModel> {
    model: &'a mut M,
    config: MiningConfig,
}

impl<'a, M: PoseModel> FineTuneRunner<'a, M> {
    /// Create a new runner.
    pub fn new(model: &'a mut M, config: MiningConfig) -> Self {
        Self { model, config }
    }

    /// Run all configured epochs over the train and validation splits.
    ///
    /// `on_epoch` is invoked after each epoch with the epoch index (0-based)
    /// and the pooled train/val losses.
    ///
    /// # Errors
    ///
    /// Returns an error if an image fails to load or inference fails.
    pub fn run<F>(
        &mut self,
        train: &[&PoseSample],
        val: &[&PoseSample],
        mut on_epoch: F,
    ) -> Result<LossHistory>
    where
        F: FnMut(usize, f32, f32),
    {
        let mut history = LossHistory::default();

        for epoch in 0..self.config.epochs {
            let train_loss = self.run_epoch(train)?;
            let val_loss = self.run_epoch(val)?;

            history.train.push(train_loss);
            history.val.push(val_loss);
            on_epoch(epoch, train_loss, val_loss);
        }

        Ok(history)
    }

    /// One pass over a split, pooling the masked loss over all its batches.
    ///
    /// The squared-error sum and valid-keypoint count are accumulated across
    /// batches, so the epoch number equals the masked loss over the split's
    /// pooled valid keypoints. A split with no valid keypoints reports 0.0.
    fn run_epoch(&mut self, samples: &[&PoseSample]) -> Result<f32> {
        let mut total_sum = 0.0f32;
        let mut total_valid = 0usize;

        for chunk in samples.chunks(self.config.batch_size.max(1)) {
            let batch = self.assemble_batch(chunk)?;
            let predictions = self.model.predict(&batch.images)?;

            let (sum, valid) = masked_loss_components(&batch.targets, &predictions);
            total_sum += sum;
            total_valid += valid;
        }

        if total_valid == 0 {
            return Ok(0.0);
        }
        #[allow(clippy::cast_precision_loss)]
        Ok(total_sum / total_valid as f32)
    }

    /// Load and preprocess a chunk of samples in parallel, then stack them.
    fn assemble_batch(&self, chunk: &[&PoseSample]) -> Result<Batch> {
        let input_size = self.config.input_size;

        let prepared = chunk
            .par_iter()
            .map(|sample| {
                let image = image::open(&sample.path).map_err(|e| {
                    MiningError::ImageError(format!(
                        "Failed to load image {}: {e}",
                        sample.path.display()
                    ))
                })?;
                let preprocessed = preprocess_image(&image, input_size)?;
                // Hard cases always carry exactly one person; anything else
                // gets the all-zero target and contributes nothing to the
                // masked loss.
                let target = sample
                    .persons
                    .first()
                    .cloned()
                    .unwrap_or_else(Keypoints::zeros);
                Ok((
                    preprocessed,
                    target.data().clone(),
                    sample.path.to_string_lossy().to_string(),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut batches = Vec::with_capacity(1);
        let mut batcher = SampleBatcher::new(chunk.len(), input_size, |batch| batches.push(batch));
        for (preprocessed, target, path) in prepared {
            batcher.add(preprocessed, target, path);
        }
        batcher.flush();
        drop(batcher);

        batches.pop().ok_or_else(|| {
            MiningError::InferenceError("Empty batch after preprocessing".to_string())
        })
    }
}
