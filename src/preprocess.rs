//! Raster normalization for the digit classifier.
//!
//! Turns an arbitrary-size, arbitrary-channel upload into the exact tensor
//! the classifier was trained on: shape (1, 28, 28, 1), values in [0, 1].
//! Each stage is a pure function so the shape and value contracts can be
//! tested in isolation.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, GrayImage};
use ndarray::Array4;

use crate::error::PredictError;

/// Classifier input width in pixels.
pub const INPUT_WIDTH: u32 = 28;
/// Classifier input height in pixels.
pub const INPUT_HEIGHT: u32 = 28;

/// Maps 8-bit channel values into the [0, 1] range the classifier was
/// trained on. This is the training-time convention; feeding unscaled
/// 0-255 values silently degrades accuracy, so the scale lives here as the
/// single named constant applied anywhere pixel values become floats.
pub const PIXEL_SCALE: f32 = 1.0 / 255.0;

/// The one resize policy used for anything fed to the classifier.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Decodes uploaded bytes into a raster.
///
/// Fails with `InvalidImage` on an empty payload or bytes no decoder
/// recognizes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, PredictError> {
    if bytes.is_empty() {
        return Err(PredictError::invalid_image("empty payload"));
    }
    image::load_from_memory(bytes)
        .map_err(|e| PredictError::invalid_image(format!("undecodable payload: {e}")))
}

/// Collapses any channel layout to single-channel grayscale using the
/// standard luma weighting implemented by the `image` crate. Alpha is
/// ignored; already-grayscale input passes through with identical values.
pub fn reduce_channels(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Resamples to exactly 28x28 with the fixed `Triangle` filter.
pub fn resize_to_input(gray: &GrayImage) -> GrayImage {
    imageops::resize(gray, INPUT_WIDTH, INPUT_HEIGHT, RESIZE_FILTER)
}

/// Scales 8-bit values by [`PIXEL_SCALE`] and packs a single-example NHWC
/// batch of shape (1, 28, 28, 1).
///
/// The input must already be 28x28; this stage does no resampling.
pub fn scale_to_tensor(gray: &GrayImage) -> Array4<f32> {
    let mut tensor = Array4::zeros((1, INPUT_HEIGHT as usize, INPUT_WIDTH as usize, 1));
    for (x, y, pixel) in gray.enumerate_pixels() {
        tensor[[0, y as usize, x as usize, 0]] = f32::from(pixel[0]) * PIXEL_SCALE;
    }
    tensor
}

/// Runs the full normalization pipeline: channel reduction, spatial resize,
/// value scaling, shape assembly.
///
/// Fails with `InvalidImage` when the raster has a zero dimension. No other
/// failure is possible and nothing here performs I/O.
pub fn normalize(img: &DynamicImage) -> Result<Array4<f32>, PredictError> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(PredictError::invalid_image(format!(
            "degenerate dimensions {width}x{height}"
        )));
    }
    let gray = reduce_channels(img);
    let resized = resize_to_input(&gray);
    Ok(scale_to_tensor(&resized))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, Rgb, RgbImage, Rgba, RgbaImage};

    fn assert_tensor_well_formed(tensor: &Array4<f32>) {
        assert_eq!(tensor.shape(), &[1, 28, 28, 1]);
        for &v in tensor.iter() {
            assert!((0.0..=1.0).contains(&v), "value {v} outside [0, 1]");
        }
    }

    #[test]
    fn normalizes_arbitrary_rasters_to_fixed_shape() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            150,
            150,
            Rgba([200, 30, 90, 255]),
        ));
        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 13, Rgb([7, 7, 7])));
        let tiny = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([128])));

        for img in [rgba, rgb, tiny] {
            let tensor = normalize(&img).unwrap();
            assert_tensor_well_formed(&tensor);
        }
    }

    #[test]
    fn blank_canvas_maps_to_zero_tensor() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(150, 150, Rgba([0, 0, 0, 255])));
        let tensor = normalize(&img).unwrap();
        assert!(tensor.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn saturated_canvas_maps_to_ones() {
        let img =
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(96, 96, Rgba([255, 255, 255, 255])));
        let tensor = normalize(&img).unwrap();
        assert!(tensor.iter().all(|&v| (v - 1.0).abs() < f32::EPSILON));
    }

    #[test]
    fn already_normalized_input_is_near_identity() {
        let gray = GrayImage::from_fn(INPUT_WIDTH, INPUT_HEIGHT, |x, y| {
            Luma([((x * 7 + y * 3) % 256) as u8])
        });
        let tensor = normalize(&DynamicImage::ImageLuma8(gray.clone())).unwrap();
        for (x, y, pixel) in gray.enumerate_pixels() {
            let expected = f32::from(pixel[0]) * PIXEL_SCALE;
            let got = tensor[[0, y as usize, x as usize, 0]];
            assert!(
                (got - expected).abs() <= 2.0 * PIXEL_SCALE,
                "pixel ({x},{y}): expected {expected}, got {got}"
            );
        }
    }

    #[test]
    fn grayscale_values_survive_channel_reduction() {
        let gray = GrayImage::from_fn(28, 28, |x, _| Luma([(x * 9 % 256) as u8]));
        let reduced = reduce_channels(&DynamicImage::ImageLuma8(gray.clone()));
        assert_eq!(gray, reduced);
    }

    #[test]
    fn degenerate_dimensions_are_rejected() {
        let img = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        let err = normalize(&img).unwrap_err();
        assert!(matches!(err, PredictError::InvalidImage { .. }));
    }

    #[test]
    fn decode_rejects_empty_and_garbage_bytes() {
        assert!(matches!(
            decode(&[]).unwrap_err(),
            PredictError::InvalidImage { .. }
        ));
        assert!(matches!(
            decode(b"definitely not an image").unwrap_err(),
            PredictError::InvalidImage { .. }
        ));
    }
}
