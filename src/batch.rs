// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Batch assembly for preprocessed pose samples.
//!
//! This module provides the [`SampleBatcher`] struct, which buffers
//! preprocessed images with their keypoint targets and emits stacked
//! [`Batch`]es to a callback.

use ndarray::{Array2, Array3, Array4, Axis, s};

use crate::keypoints::NUM_KEYPOINTS;
use crate::preprocessing::PreprocessResult;

/// One stacked batch ready for the model boundary.
#[derive(Debug, Clone)]
pub struct Batch {
    /// Integer image tensor of shape (B, S, S, 3).
    pub images: Array4<i32>,
    /// Ground-truth keypoints of shape (B, 17, 3) in `(y, x, visibility)`.
    pub targets: Array3<f32>,
    /// Source path per sample, for reporting.
    pub paths: Vec<String>,
}

impl Batch {
    /// Number of samples in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Check if the batch is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// A batcher for preprocessed samples.
///
/// Buffers samples until `batch_size` is reached, stacks them, and invokes
/// the callback with the assembled [`Batch`]. Call [`SampleBatcher::flush`]
/// after the last sample to emit the final partial batch.
///
/// # Example
///
/// ```no_run
/// use hardcase_miner::batch::SampleBatcher;
///
/// let mut batches = Vec::new();
/// let mut batcher = SampleBatcher::new(8, 256, |batch| batches.push(batch));
/// // batcher.add(preprocessed, target, path);
/// batcher.flush();
/// ```
pub struct SampleBatcher<F>
where
    F: FnMut(Batch),
{
    batch_size: usize,
    input_size: usize,
    images: Vec<Array4<i32>>,
    targets: Vec<Array2<f32>>,
    paths: Vec<String>,
    callback: F,
}

impl<F> SampleBatcher<F>
where
    F: FnMut(Batch),
{
    /// Create a new `SampleBatcher`.
    ///
    /// # Arguments
    ///
    /// * `batch_size` - Number of samples per emitted batch.
    /// * `input_size` - Square input resolution every sample was resized to.
    /// * `callback` - A closure receiving each assembled batch.
    pub fn new(batch_size: usize, input_size: usize, callback: F) -> Self {
        Self {
            batch_size: batch_size.max(1),
            input_size,
            images: Vec::with_capacity(batch_size),
            targets: Vec::with_capacity(batch_size),
            paths: Vec::with_capacity(batch_size),
            callback,
        }
    }

    /// Add a preprocessed sample to the batch.
    ///
    /// If the batch becomes full, it is automatically emitted.
    ///
    /// # Panics
    ///
    /// Panics if the tensor or target shape disagrees with the batcher's
    /// configured input size.
    pub fn add(&mut self, preprocessed: PreprocessResult, target: Array2<f32>, path: String) {
        assert_eq!(
            preprocessed.tensor.shape(),
            [1, self.input_size, self.input_size, 3],
            "preprocessed tensor shape mismatch"
        );
        assert_eq!(target.shape(), [NUM_KEYPOINTS, 3], "target shape mismatch");

        self.images.push(preprocessed.tensor);
        self.targets.push(target);
        self.paths.push(path);

        if self.paths.len() >= self.batch_size {
            self.emit();
        }
    }

    /// Emit any remaining samples as a final partial batch.
    pub fn flush(&mut self) {
        self.emit();
    }

    fn emit(&mut self) {
        if self.paths.is_empty() {
            return;
        }

        let n = self.paths.len();
        let s = self.input_size;

        let mut images = Array4::zeros((n, s, s, 3));
        let mut targets = Array3::zeros((n, NUM_KEYPOINTS, 3));
        for (i, (image, target)) in self.images.drain(..).zip(self.targets.drain(..)).enumerate() {
            images
                .slice_mut(s![i, .., .., ..])
                .assign(&image.index_axis(Axis(0), 0));
            targets.slice_mut(s![i, .., ..]).assign(&target);
        }

        let batch = Batch {
            images,
            targets,
            paths: std::mem::take(&mut self.paths),
        };
        (self.callback)(batch);

        self.paths = Vec::with_capacity(self.batch_size);
    }
}
