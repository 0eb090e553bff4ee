// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pretrained pose-model boundary.
//!
//! The miner treats the pose network as an opaque callable: a fixed-size
//! integer-encoded image tensor goes in, a `(batch, 1, 1, 17, 3)` keypoint
//! tensor in `(y, x, confidence)` form comes out. [`OnnxPoseModel`] is the
//! ONNX Runtime implementation of that boundary.

use std::path::Path;

use ndarray::{Array4, Array5, s};
use ort::session::Session;
use ort::value::TensorRef;

use crate::config::MiningConfig;
use crate::error::{MiningError, Result};
use crate::keypoints::NUM_KEYPOINTS;

/// Opaque pretrained pose-estimation network.
pub trait PoseModel {
    /// Square input resolution the model expects.
    fn input_size(&self) -> usize;

    /// Run the model on a batch of integer-encoded NHWC images.
    ///
    /// # Arguments
    ///
    /// * `images` - Tensor of shape (B, S, S, 3).
    ///
    /// # Returns
    ///
    /// Keypoint tensor of shape (B, 1, 1, 17, 3) in `(y, x, confidence)`
    /// form with coordinates normalized to the input square.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the output shape is wrong.
    fn predict(&mut self, images: &Array4<i32>) -> Result<Array5<f32>>;
}

/// ONNX Runtime-backed pose model.
///
/// Single-pose networks accept one image per session run, so batches are
/// executed sample-at-a-time and the outputs stacked.
///
/// # Example
///
/// ```no_run
/// use hardcase_miner::{MiningConfig, OnnxPoseModel};
///
/// let model = OnnxPoseModel::load("movenet-singlepose-thunder.onnx", &MiningConfig::default())?;
/// # Ok::<(), hardcase_miner::MiningError>(())
/// ```
pub struct OnnxPoseModel {
    /// ONNX Runtime session.
    session: Session,
    /// Input tensor name.
    input_name: String,
    /// Output tensor name.
    output_name: String,
    /// Square input resolution.
    input_size: usize,
    /// Whether model has been warmed up.
    warmed_up: bool,
}

impl OnnxPoseModel {
    /// Load a pose model from an ONNX file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the ONNX model file.
    /// * `config` - Run configuration (input resolution, thread count).
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P, config: &MiningConfig) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MiningError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                MiningError::ModelLoadError(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| {
                MiningError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(config.num_threads)
            .map_err(|e| {
                MiningError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| MiningError::ModelLoadError(format!("Failed to load model: {e}")))?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "input".to_string());
        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "output_0".to_string());

        Ok(Self {
            session,
            input_name,
            output_name,
            input_size: config.input_size,
            warmed_up: false,
        })
    }

    /// Warm up the model by running inference with a dummy input.
    ///
    /// Pre-allocates memory and optimizes the execution graph for faster
    /// subsequent inferences. Warmup is automatically called on first predict.
    ///
    /// # Errors
    ///
    /// Returns an error if the warmup inference fails.
    pub fn warmup(&mut self) -> Result<()> {
        if self.warmed_up {
            return Ok(());
        }

        let dummy = Array4::<i32>::zeros((1, self.input_size, self.input_size, 3));
        let _ = self.run_single(&dummy)?;

        self.warmed_up = true;
        Ok(())
    }

    /// Run one session call on a (1, S, S, 3) tensor, returning the flat
    /// 17x3 keypoint output.
    fn run_single(&mut self, input: &Array4<i32>) -> Result<Vec<f32>> {
        let input_contiguous = input.as_standard_layout();
        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            MiningError::InferenceError(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![&self.input_name => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| MiningError::InferenceError(format!("Inference failed: {e}")))?;

        let output = outputs.get(self.output_name.as_str()).ok_or_else(|| {
            MiningError::InferenceError(format!("Output '{}' not found", self.output_name))
        })?;

        let (shape, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| MiningError::InferenceError(format!("Failed to extract output: {e}")))?;

        let numel: usize = shape.iter().map(|&d| d as usize).product();
        if numel != NUM_KEYPOINTS * 3 {
            return Err(MiningError::InferenceError(format!(
                "Expected {} output values per sample, got {numel} (shape {shape:?})",
                NUM_KEYPOINTS * 3
            )));
        }

        Ok(data.to_vec())
    }
}

impl PoseModel for OnnxPoseModel {
    fn input_size(&self) -> usize {
        self.input_size
    }

    fn predict(&mut self, images: &Array4<i32>) -> Result<Array5<f32>> {
        if !self.warmed_up {
            self.warmup()?;
        }

        let shape = images.shape();
        if shape[1] != self.input_size || shape[2] != self.input_size || shape[3] != 3 {
            return Err(MiningError::InferenceError(format!(
                "Expected input of shape (B, {0}, {0}, 3), got {shape:?}",
                self.input_size
            )));
        }

        let batch = shape[0];
        let mut predictions = Array5::zeros((batch, 1, 1, NUM_KEYPOINTS, 3));

        for b in 0..batch {
            let sample = images.slice(s![b..=b, .., .., ..]).to_owned();
            let flat = self.run_single(&sample)?;
            for k in 0..NUM_KEYPOINTS {
                predictions[[b, 0, 0, k, 0]] = flat[k * 3];
                predictions[[b, 0, 0, k, 1]] = flat[k * 3 + 1];
                predictions[[b, 0, 0, k, 2]] = flat[k * 3 + 2];
            }
        }

        Ok(predictions)
    }
}

impl std::fmt::Debug for OnnxPoseModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPoseModel")
            .field("input_name", &self.input_name)
            .field("output_name", &self.output_name)
            .field("input_size", &self.input_size)
            .finish()
    }
}
