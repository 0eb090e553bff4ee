// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]

//! # Hard-Case Pose Mining Library
//!
//! Mines "hard case" human poses (occluded or crossed limbs) from
//! COCO-format keypoint corpora and drives fine-tuning of a pretrained
//! single-pose model on the mined subset.
//!
//! ## Features
//!
//! - **Geometric Mining** - Flags single-person images with occluded key limb
//!   joints or crossed arms/legs using normalized keypoint geometry
//! - **COCO Keypoints** - Reads standard COCO person-keypoint annotation JSON
//! - **ONNX Runtime** - Runs the pretrained pose model through ONNX Runtime
//! - **Masked Loss** - Pools the masked keypoint MSE over each epoch's valid
//!   (labeled) keypoints
//! - **Parallel Preprocessing** - Loads and letterboxes batch images with Rayon
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use hardcase_miner::{Dataset, MiningConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let dataset = Dataset::load("person_keypoints_val2017.json", "val2017")?;
//!     let config = MiningConfig::new();
//!
//!     let hard = dataset.mine_hard_cases(config.proximity_threshold, None);
//!     println!("Found {} hard cases", hard.len());
//!
//!     for (sample, reason) in &hard {
//!         println!("  {}: {reason}", sample.path.display());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Mine hard cases from a COCO corpus
//! hardcase-miner mine --annotations person_keypoints_val2017.json --images val2017/
//!
//! # Write the mined subset as JSON
//! hardcase-miner mine -a train.json -i train2017/ --output hard.json
//!
//! # Fine-tune on mined hard cases (auto-downloads the default model)
//! hardcase-miner finetune -a train.json -i train2017/ \
//!     --val-annotations val.json --val-images val2017/
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`mining`] | Hard-case classifier ([`HardCaseReason`], [`is_hard_case`]) |
//! | [`keypoints`] | COCO 17-keypoint layout ([`Keypoints`], [`Visibility`]) |
//! | [`dataset`] | COCO annotation loading ([`Dataset`], [`PoseSample`]) |
//! | [`loss`] | Masked keypoint loss ([`masked_keypoint_loss`]) |
//! | [`model`] | ONNX pose model ([`PoseModel`], [`OnnxPoseModel`]) |
//! | [`finetune`] | Epoch driver ([`FineTuneRunner`], [`LossHistory`]) |
//! | [`preprocessing`] | Letterbox resize to the model input tensor |
//! | [`batch`] | Sample batching ([`SampleBatcher`]) |
//! | [`config`] | Run configuration ([`MiningConfig`]) |
//! | [`download`] | Default model auto-download |
//! | [`error`] | Error types ([`MiningError`], [`Result`]) |

// Modules
pub mod batch;
pub mod cli;
pub mod config;
pub mod dataset;
pub mod download;
pub mod error;
pub mod finetune;
pub mod keypoints;
pub mod loss;
pub mod mining;
pub mod model;
pub mod preprocessing;

// Re-export main types for convenience
pub use config::MiningConfig;
pub use dataset::{Dataset, PoseSample};
pub use error::{MiningError, Result};
pub use finetune::{FineTuneRunner, LossHistory};
pub use keypoints::{Keypoints, NUM_KEYPOINTS, Visibility};
pub use mining::{HardCaseReason, PROXIMITY_THRESHOLD, classify_person, classify_sample, is_hard_case};
pub use model::{OnnxPoseModel, PoseModel};

// Re-export loss and preprocessing utilities
pub use loss::{masked_keypoint_loss, masked_loss_components};
pub use preprocessing::{PreprocessResult, preprocess_image};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
