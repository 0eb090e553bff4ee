// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! COCO 17-keypoint layout and per-person keypoint arrays.
//!
//! All keypoints use the COCO convention: 17 anatomical landmarks per person,
//! each stored as a `(y, x, visibility)` row with coordinates normalized to
//! `[0, 1]` relative to the image dimensions.

use ndarray::Array2;

use crate::error::{MiningError, Result};

/// Number of keypoints in the COCO layout.
pub const NUM_KEYPOINTS: usize = 17;

/// COCO keypoint index: nose.
pub const NOSE: usize = 0;
/// COCO keypoint index: left shoulder.
pub const LEFT_SHOULDER: usize = 5;
/// COCO keypoint index: right shoulder.
pub const RIGHT_SHOULDER: usize = 6;
/// COCO keypoint index: left wrist.
pub const LEFT_WRIST: usize = 9;
/// COCO keypoint index: right wrist.
pub const RIGHT_WRIST: usize = 10;
/// COCO keypoint index: left knee.
pub const LEFT_KNEE: usize = 13;
/// COCO keypoint index: right knee.
pub const RIGHT_KNEE: usize = 14;
/// COCO keypoint index: left ankle.
pub const LEFT_ANKLE: usize = 15;
/// COCO keypoint index: right ankle.
pub const RIGHT_ANKLE: usize = 16;

/// COCO keypoint visibility tiers.
///
/// The annotation flag is the third value of each keypoint triple:
/// 0 = not labeled, 1 = labeled but occluded, 2 = labeled and visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Keypoint was not annotated.
    Unlabeled,
    /// Keypoint is annotated but hidden (behind clothing, another limb, etc.).
    Occluded,
    /// Keypoint is annotated and visible.
    Visible,
}

impl Visibility {
    /// Convert a raw COCO visibility flag into a tier.
    ///
    /// Values above 2 (out of convention) are treated as visible.
    #[must_use]
    pub fn from_flag(flag: f32) -> Self {
        if flag < 1.0 {
            Self::Unlabeled
        } else if flag < 2.0 {
            Self::Occluded
        } else {
            Self::Visible
        }
    }
}

/// One person's keypoints as a (17, 3) array of `(y, x, visibility)` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoints {
    data: Array2<f32>,
}

impl Keypoints {
    /// Create a new `Keypoints` from a (17, 3) array.
    ///
    /// # Errors
    ///
    /// Returns an error if the array does not have shape (17, 3).
    pub fn new(data: Array2<f32>) -> Result<Self> {
        if data.shape() != [NUM_KEYPOINTS, 3] {
            return Err(MiningError::AnnotationError(format!(
                "Expected keypoint array of shape ({NUM_KEYPOINTS}, 3), got {:?}",
                data.shape()
            )));
        }
        Ok(Self { data })
    }

    /// Build keypoints from a flat COCO annotation triple list.
    ///
    /// COCO stores `[x, y, v]` in pixel coordinates; this converts each
    /// triple to a normalized `(y, x, v)` row using the image dimensions.
    ///
    /// # Errors
    ///
    /// Returns an error if `flat` does not contain exactly 51 values or the
    /// image dimensions are zero.
    pub fn from_coco_pixels(flat: &[f32], img_width: f32, img_height: f32) -> Result<Self> {
        if flat.len() != NUM_KEYPOINTS * 3 {
            return Err(MiningError::AnnotationError(format!(
                "Expected {} keypoint values, got {}",
                NUM_KEYPOINTS * 3,
                flat.len()
            )));
        }
        if img_width <= 0.0 || img_height <= 0.0 {
            return Err(MiningError::AnnotationError(format!(
                "Invalid image dimensions {img_width}x{img_height}"
            )));
        }

        let mut data = Array2::zeros((NUM_KEYPOINTS, 3));
        for (i, triple) in flat.chunks_exact(3).enumerate() {
            data[[i, 0]] = triple[1] / img_height; // y
            data[[i, 1]] = triple[0] / img_width; // x
            data[[i, 2]] = triple[2]; // visibility flag
        }
        Self::new(data)
    }

    /// All-zero keypoints (every joint unlabeled at the origin).
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            data: Array2::zeros((NUM_KEYPOINTS, 3)),
        }
    }

    /// Get the normalized `(y, x)` coordinates of a keypoint.
    #[must_use]
    pub fn yx(&self, index: usize) -> (f32, f32) {
        (self.data[[index, 0]], self.data[[index, 1]])
    }

    /// Get the visibility tier of a keypoint.
    #[must_use]
    pub fn visibility(&self, index: usize) -> Visibility {
        Visibility::from_flag(self.data[[index, 2]])
    }

    /// Borrow the underlying (17, 3) array.
    #[must_use]
    pub const fn data(&self) -> &Array2<f32> {
        &self.data
    }
}

/// Squared Euclidean distance between two normalized `(y, x)` points.
#[must_use]
pub fn squared_distance(a: (f32, f32), b: (f32, f32)) -> f32 {
    let dy = a.0 - b.0;
    let dx = a.1 - b.1;
    dy.mul_add(dy, dx * dx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_flag() {
        assert_eq!(Visibility::from_flag(0.0), Visibility::Unlabeled);
        assert_eq!(Visibility::from_flag(1.0), Visibility::Occluded);
        assert_eq!(Visibility::from_flag(2.0), Visibility::Visible);
    }

    #[test]
    fn test_from_coco_pixels_normalizes() {
        // Single annotated keypoint at pixel (x=320, y=120) in a 640x480 image.
        let mut flat = vec![0.0f32; NUM_KEYPOINTS * 3];
        flat[NOSE * 3] = 320.0;
        flat[NOSE * 3 + 1] = 120.0;
        flat[NOSE * 3 + 2] = 2.0;

        let kpts = Keypoints::from_coco_pixels(&flat, 640.0, 480.0).unwrap();
        let (y, x) = kpts.yx(NOSE);
        assert!((y - 0.25).abs() < 1e-6);
        assert!((x - 0.5).abs() < 1e-6);
        assert_eq!(kpts.visibility(NOSE), Visibility::Visible);
    }

    #[test]
    fn test_from_coco_pixels_rejects_bad_length() {
        let flat = vec![0.0f32; 50];
        assert!(Keypoints::from_coco_pixels(&flat, 640.0, 480.0).is_err());
    }

    #[test]
    fn test_new_rejects_wrong_shape() {
        let data = Array2::zeros((16, 3));
        assert!(Keypoints::new(data).is_err());
    }

    #[test]
    fn test_squared_distance() {
        let d = squared_distance((0.0, 0.0), (0.3, 0.4));
        assert!((d - 0.25).abs() < 1e-6);
    }
}
