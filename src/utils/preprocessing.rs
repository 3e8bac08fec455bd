//! Image preprocessing for model inference

use crate::{
    error::{BgRemovalError, Result},
    models::PreprocessingConfig,
};
use image::{imageops::FilterType, DynamicImage, RgbImage};
use ndarray::Array4;

/// Image to tensor conversion used before every inference
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Preprocess image for model inference
    ///
    /// - RGB conversion
    /// - Resize to the model's target size (aspect ratio is not preserved)
    /// - Scale by the brightest channel value, then per-channel normalization
    /// - NCHW layout
    ///
    /// # Errors
    /// - Zero-sized image or target size
    pub fn preprocess_for_inference(
        image: &DynamicImage,
        preprocessing_config: &PreprocessingConfig,
    ) -> Result<Array4<f32>> {
        let [target_width, target_height] = preprocessing_config.target_size;
        if target_width == 0 || target_height == 0 {
            return Err(BgRemovalError::invalid_config(format!(
                "Model target size must be positive, got {target_width}x{target_height}"
            )));
        }
        if image.width() == 0 || image.height() == 0 {
            return Err(BgRemovalError::processing("Cannot process an empty image"));
        }

        let rgb_image = image.to_rgb8();
        let resized = image::imageops::resize(
            &rgb_image,
            target_width,
            target_height,
            FilterType::Lanczos3,
        );

        Ok(Self::canvas_to_tensor(&resized, preprocessing_config))
    }

    /// Convert resized canvas to normalized tensor
    fn canvas_to_tensor(canvas: &RgbImage, preprocessing_config: &PreprocessingConfig) -> Array4<f32> {
        let (width, height) = canvas.dimensions();
        let mut tensor = Array4::<f32>::zeros((1, 3, height as usize, width as usize));

        // An all-black image would divide by zero; its tensor is just -mean/std
        let max_value = canvas.as_raw().iter().copied().max().unwrap_or(0);
        let scale = if max_value == 0 { 1.0 } else { f32::from(max_value) };

        let mean = preprocessing_config.normalization_mean;
        let std = preprocessing_config.normalization_std;

        for (x, y, pixel) in canvas.enumerate_pixels() {
            for (channel, value) in pixel.0.iter().enumerate() {
                let normalized = (f32::from(*value) / scale
                    - mean.get(channel).copied().unwrap_or(0.0))
                    / std.get(channel).copied().unwrap_or(1.0);
                if let Some(elem) = tensor.get_mut([0, channel, y as usize, x as usize]) {
                    *elem = normalized;
                }
            }
        }

        tensor
    }
}
