//! Inference backend abstraction

use crate::{config::RemovalConfig, error::Result, models::PreprocessingConfig};
use ndarray::Array4;
use std::time::Duration;

/// Trait for inference backends
pub trait InferenceBackend {
    /// Load the model and prepare the backend
    ///
    /// Returns the model load time, or `None` when the backend was already
    /// initialized.
    ///
    /// # Errors
    /// - Model loading or parsing errors
    /// - Invalid configuration parameters
    fn initialize(&mut self, config: &RemovalConfig) -> Result<Option<Duration>>;

    /// Run inference on an NCHW input tensor and return the first output tensor
    ///
    /// # Errors
    /// - Backend not initialized
    /// - Model inference failures
    /// - Output tensor is not 4-D
    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>>;

    /// Preprocessing the loaded model expects
    ///
    /// # Errors
    /// - No model attached to this backend
    fn get_preprocessing_config(&self) -> Result<PreprocessingConfig>;

    /// Check if backend is initialized
    fn is_initialized(&self) -> bool;
}

/// Copy a dynamically shaped output into an `Array4`, validating rank
///
/// # Errors
/// - Output is not 4-D or the data length disagrees with the shape
pub(crate) fn output_to_array4(shape: &[usize], data: Vec<f32>) -> Result<Array4<f32>> {
    let [n, c, h, w] = shape else {
        return Err(crate::error::BgRemovalError::inference(format!(
            "Expected 4D output tensor, got {}D",
            shape.len()
        )));
    };

    Array4::from_shape_vec((*n, *c, *h, *w), data).map_err(|e| {
        crate::error::BgRemovalError::inference(format!("Failed to reshape output tensor: {e}"))
    })
}
