//! Core types for background removal operations

use crate::error::{BgRemovalError, Result};
use image::{imageops::FilterType, ImageBuffer, Luma, Rgba, RgbaImage};

/// Segmentation mask produced by the model
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationMask {
    /// Mask data as grayscale values (0-255), row-major
    pub data: Vec<u8>,

    /// Mask dimensions (width, height)
    pub dimensions: (u32, u32),
}

impl SegmentationMask {
    /// Create a new segmentation mask
    #[must_use]
    pub fn new(data: Vec<u8>, dimensions: (u32, u32)) -> Self {
        Self { data, dimensions }
    }

    /// Build a mask from raw model scores by min-max normalizing them
    ///
    /// A constant score map carries no foreground information and becomes
    /// an all-zero mask.
    ///
    /// # Errors
    /// - `scores` length does not match `width * height`
    pub fn from_scores(scores: &[f32], dimensions: (u32, u32)) -> Result<Self> {
        let (width, height) = dimensions;
        let expected = width as usize * height as usize;
        if scores.len() != expected {
            return Err(BgRemovalError::processing(format!(
                "Mask has {} values, expected {expected} for {width}x{height}",
                scores.len()
            )));
        }

        let (min, max) = scores
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        let range = max - min;

        let data = if range.is_finite() && range > 0.0 {
            scores
                .iter()
                .map(|&v| (((v - min) / range).clamp(0.0, 1.0) * 255.0) as u8)
                .collect()
        } else {
            vec![0; expected]
        };

        Ok(Self::new(data, dimensions))
    }

    /// Convert mask to a grayscale image
    ///
    /// # Errors
    /// - Data length does not match the dimensions
    pub fn to_image(&self) -> Result<ImageBuffer<Luma<u8>, Vec<u8>>> {
        let (width, height) = self.dimensions;
        ImageBuffer::from_raw(width, height, self.data.clone())
            .ok_or_else(|| BgRemovalError::processing("Failed to create image from mask data"))
    }

    /// Resize mask to new dimensions
    ///
    /// # Errors
    /// - Data length does not match the current dimensions
    pub fn resize(&self, new_width: u32, new_height: u32) -> Result<Self> {
        if self.dimensions == (new_width, new_height) {
            return Ok(self.clone());
        }

        let image = self.to_image()?;
        let resized =
            image::imageops::resize(&image, new_width, new_height, FilterType::Lanczos3);

        Ok(Self::new(resized.into_raw(), (new_width, new_height)))
    }

    /// Cut out an RGBA image with this mask
    ///
    /// The resulting alpha is `mask * alpha / 255`. Fully transparent
    /// pixels are written as `(0, 0, 0, 0)`.
    ///
    /// # Errors
    /// - Image and mask dimensions do not match
    pub fn apply_to_image(&self, image: &RgbaImage) -> Result<RgbaImage> {
        if image.dimensions() != self.dimensions {
            let (img_width, img_height) = image.dimensions();
            let (mask_width, mask_height) = self.dimensions;
            return Err(BgRemovalError::processing(format!(
                "Image ({img_width}x{img_height}) and mask ({mask_width}x{mask_height}) dimensions do not match"
            )));
        }

        let (width, height) = image.dimensions();
        let mut result = RgbaImage::new(width, height);

        for ((source, target), &mask_value) in
            image.pixels().zip(result.pixels_mut()).zip(&self.data)
        {
            let Rgba([r, g, b, a]) = *source;
            let alpha = (u16::from(mask_value) * u16::from(a) / 255) as u8;
            *target = if alpha == 0 {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([r, g, b, alpha])
            };
        }

        Ok(result)
    }

    /// Fraction of pixels with a non-zero mask value
    #[must_use]
    pub fn foreground_ratio(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        let foreground = self.data.iter().filter(|&&v| v > 0).count();
        foreground as f32 / self.data.len() as f32
    }
}
