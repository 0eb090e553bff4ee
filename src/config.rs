// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Run configuration for mining and fine-tuning.
//!
//! This module defines the [`MiningConfig`] struct, which collects the
//! constants a run is parameterized by: model input resolution, batch size,
//! sample caps, epoch count, the hard-case proximity threshold, and the
//! fine-tuning learning rate.

use crate::mining::PROXIMITY_THRESHOLD;

/// Configuration for a mining / fine-tuning run.
///
/// Uses a builder pattern for convenient construction.
///
/// # Example
///
/// ```rust
/// use hardcase_miner::MiningConfig;
///
/// let config = MiningConfig::new()
///     .with_input_size(256)
///     .with_batch_size(8)
///     .with_epochs(5)
///     .with_proximity_threshold(0.08);
/// ```
#[derive(Debug, Clone)]
pub struct MiningConfig {
    /// Square model input resolution in pixels.
    pub input_size: usize,
    /// Number of samples per batch.
    pub batch_size: usize,
    /// Maximum number of mined training samples to use per epoch.
    pub train_samples: usize,
    /// Maximum number of mined validation samples to use per epoch.
    pub val_samples: usize,
    /// Number of epochs to run.
    pub epochs: usize,
    /// Normalized distance below which two keypoints count as crossed.
    pub proximity_threshold: f32,
    /// Fine-tuning learning rate, forwarded to the training backend.
    /// Kept low so fine-tuning does not destroy the pretrained weights.
    pub learning_rate: f32,
    /// Number of intra-op threads for ONNX Runtime.
    /// Setting this to `0` allows ONNX Runtime to choose the optimal number.
    pub num_threads: usize,
}

impl Default for MiningConfig {
    fn default() -> Self {
        Self {
            input_size: 256,
            batch_size: 8,
            train_samples: 10_000,
            val_samples: 2_000,
            epochs: 5,
            proximity_threshold: PROXIMITY_THRESHOLD,
            learning_rate: 1e-5,
            num_threads: 0,
        }
    }
}

impl MiningConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the square model input resolution.
    #[must_use]
    pub const fn with_input_size(mut self, size: usize) -> Self {
        self.input_size = size;
        self
    }

    /// Set the batch size.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the training sample cap.
    #[must_use]
    pub const fn with_train_samples(mut self, cap: usize) -> Self {
        self.train_samples = cap;
        self
    }

    /// Set the validation sample cap.
    #[must_use]
    pub const fn with_val_samples(mut self, cap: usize) -> Self {
        self.val_samples = cap;
        self
    }

    /// Set the number of epochs.
    #[must_use]
    pub const fn with_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }

    /// Set the hard-case proximity threshold.
    #[must_use]
    pub const fn with_proximity_threshold(mut self, threshold: f32) -> Self {
        self.proximity_threshold = threshold;
        self
    }

    /// Set the fine-tuning learning rate.
    #[must_use]
    pub const fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// Set the number of intra-op threads.
    ///
    /// Set to `0` for auto-configuration.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }
}
