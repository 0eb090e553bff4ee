// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for the pose-model boundary.
//!
//! Resizes an image with aspect-preserving, centered zero padding to the
//! model's square input resolution and encodes it as an integer NHWC tensor.
//! Keypoint targets pass through unchanged; they stay normalized to the
//! original image.

use fast_image_resize::{FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::{DynamicImage, GenericImageView};
use ndarray::Array4;

use crate::error::{MiningError, Result};

/// Padding value for the letterbox borders.
///
/// Matches aspect-preserving resize-with-pad conventions: borders are black.
pub const PAD_VALUE: i32 = 0;

/// Result of preprocessing an image, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Integer-encoded image tensor in NHWC format, shape (1, S, S, 3).
    pub tensor: Array4<i32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (u32, u32),
}

/// Preprocess an image for pose-model input.
///
/// Performs an aspect-preserving bilinear resize, centers the result inside
/// a `target_size` x `target_size` square, and fills the borders with
/// [`PAD_VALUE`].
///
/// # Arguments
///
/// * `image` - Input image.
/// * `target_size` - Square model input resolution (e.g. 256).
///
/// # Errors
///
/// Returns an error if the image has zero dimensions or the resize fails.
pub fn preprocess_image(image: &DynamicImage, target_size: usize) -> Result<PreprocessResult> {
    let (orig_width, orig_height) = image.dimensions();
    if orig_width == 0 || orig_height == 0 {
        return Err(MiningError::ImageError(format!(
            "Cannot preprocess empty image ({orig_width}x{orig_height})"
        )));
    }

    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, target_size);

    let resized = resize_bilinear(image, new_width, new_height)?;

    // Write the resized pixels into a zero-filled square tensor at the
    // padding offset. Pad value is zero, so only the image region is touched.
    let mut tensor = Array4::from_elem((1, target_size, target_size, 3), PAD_VALUE);
    let (pad_top_usize, pad_left_usize) = (pad_top as usize, pad_left as usize);

    for (i, pixel) in resized.chunks_exact(3).enumerate() {
        let y = pad_top_usize + i / new_width as usize;
        let x = pad_left_usize + i % new_width as usize;
        tensor[[0, y, x, 0]] = i32::from(pixel[0]);
        tensor[[0, y, x, 1]] = i32::from(pixel[1]);
        tensor[[0, y, x, 2]] = i32::from(pixel[2]);
    }

    Ok(PreprocessResult {
        tensor,
        orig_shape: (orig_height, orig_width),
        scale,
        padding: (pad_top, pad_left),
    })
}

/// Bilinear resize to exact dimensions, returning raw RGB bytes.
fn resize_bilinear(image: &DynamicImage, width: u32, height: u32) -> Result<Vec<u8>> {
    let (src_w, src_h) = image.dimensions();
    let src_rgb = image.to_rgb8();

    let src_image = Image::from_vec_u8(src_w, src_h, src_rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| MiningError::ImageError(format!("Failed to create source image: {e}")))?;
    let mut dst_image = Image::new(width.max(1), height.max(1), PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| MiningError::ImageError(format!("Failed to resize image: {e}")))?;

    Ok(dst_image.into_vec())
}

/// Calculate letterbox parameters for resizing.
///
/// Computes scaled dimensions and centered padding that fit the image within
/// a `target_size` square while maintaining aspect ratio.
///
/// # Returns
///
/// Tuple containing:
/// 1. `new_width`: Scaled width.
/// 2. `new_height`: Scaled height.
/// 3. `pad_left`: Left padding.
/// 4. `pad_top`: Top padding.
/// 5. `(scale_y, scale_x)`: Scale factors.
#[must_use]
pub fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    target_size: usize,
) -> (u32, u32, u32, u32, (f32, f32)) {
    #[allow(clippy::cast_precision_loss)]
    let target = target_size as f32;
    #[allow(clippy::cast_precision_loss)]
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    // Calculate scale to fit within target while maintaining aspect ratio
    let scale = (target / orig_h).min(target / orig_w);

    // Extreme aspect ratios can round a dimension down to zero; the resized
    // image and the pixel loop both need at least one row and column.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_w = (orig_w * scale).round().clamp(1.0, target) as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let new_h = (orig_h * scale).round().clamp(1.0, target) as u32;

    // Center alignment: divide padding equally on both sides
    #[allow(clippy::cast_possible_truncation)]
    let pad_left = ((target_size as u32).saturating_sub(new_w)) / 2;
    #[allow(clippy::cast_possible_truncation)]
    let pad_top = ((target_size as u32).saturating_sub(new_h)) / 2;

    // Scale factors for mapping coordinates back to the original image
    #[allow(clippy::cast_precision_loss)]
    let scale_x = new_w as f32 / orig_w;
    #[allow(clippy::cast_precision_loss)]
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}
