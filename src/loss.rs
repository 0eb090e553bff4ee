// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Masked keypoint regression loss.
//!
//! Mean squared error over `(y, x)` coordinates, restricted to keypoints
//! whose ground-truth visibility flag is positive (occluded or visible).
//! Unlabeled keypoints are masked out and never contribute to the loss or
//! its gradient.

use ndarray::{Array3, Array5};

use crate::keypoints::NUM_KEYPOINTS;

/// Sum of masked squared errors and the count of valid keypoints.
///
/// Building block for [`masked_keypoint_loss`]; exposed so an epoch driver
/// can pool the loss over all batches instead of averaging per-batch means.
///
/// # Arguments
///
/// * `y_true` - Ground truth of shape (batch, 17, 3) in `(y, x, visibility)`.
/// * `y_pred` - Predictions of shape (batch, 1, 1, 17, 3) in `(y, x, score)`;
///   the singleton spatial dims are collapsed before use.
///
/// # Panics
///
/// Panics if the batch dimensions disagree or the keypoint dimensions are
/// not 17.
#[must_use]
pub fn masked_loss_components(y_true: &Array3<f32>, y_pred: &Array5<f32>) -> (f32, usize) {
    let batch = y_true.shape()[0];
    assert_eq!(
        y_pred.shape(),
        [batch, 1, 1, NUM_KEYPOINTS, 3],
        "prediction shape mismatch"
    );
    assert_eq!(y_true.shape()[1], NUM_KEYPOINTS, "ground-truth shape mismatch");

    let mut sum = 0.0f32;
    let mut valid = 0usize;

    for b in 0..batch {
        for k in 0..NUM_KEYPOINTS {
            // Valid means annotated: visibility 1 (occluded) or 2 (visible).
            if y_true[[b, k, 2]] <= 0.0 {
                continue;
            }
            let dy = y_true[[b, k, 0]] - y_pred[[b, 0, 0, k, 0]];
            let dx = y_true[[b, k, 1]] - y_pred[[b, 0, 0, k, 1]];
            sum += dy.mul_add(dy, dx * dx);
            valid += 1;
        }
    }

    (sum, valid)
}

/// Masked keypoint loss over a batch.
///
/// The summed squared error is divided by the total count of valid keypoints
/// across the batch, so samples with more annotated keypoints contribute
/// proportionally more. A batch with zero valid keypoints has loss 0.0.
#[must_use]
pub fn masked_keypoint_loss(y_true: &Array3<f32>, y_pred: &Array5<f32>) -> f32 {
    let (sum, valid) = masked_loss_components(y_true, y_pred);
    if valid == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let loss = sum / valid as f32;
    loss
}
