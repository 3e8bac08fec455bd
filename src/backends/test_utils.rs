//! Mock backend for exercising the processor without model files
//!
//! The mock "segments" by echoing the red channel of its input tensor, so a
//! red subject on a dark background yields a clean foreground mask.

use crate::{
    config::RemovalConfig,
    error::{BgRemovalError, Result},
    inference::InferenceBackend,
    models::PreprocessingConfig,
};
use ndarray::{s, Array4};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Mock backend for testing
#[derive(Debug, Clone)]
pub struct MockBackend {
    initialized: bool,
    preprocessing_config: PreprocessingConfig,
    /// Call history for verification in tests
    call_history: Arc<Mutex<Vec<String>>>,
    should_fail_init: bool,
    should_fail_inference: bool,
    output_shape_override: Option<(usize, usize, usize, usize)>,
}

impl MockBackend {
    /// Create a new mock backend with a 16x16 identity-normalized input
    #[must_use]
    pub fn new() -> Self {
        Self {
            initialized: false,
            preprocessing_config: PreprocessingConfig {
                target_size: [16, 16],
                normalization_mean: [0.0, 0.0, 0.0],
                normalization_std: [1.0, 1.0, 1.0],
            },
            call_history: Arc::new(Mutex::new(Vec::new())),
            should_fail_init: false,
            should_fail_inference: false,
            output_shape_override: None,
        }
    }

    /// Create a mock backend that will fail during initialization
    #[must_use]
    pub fn new_failing_init() -> Self {
        let mut backend = Self::new();
        backend.should_fail_init = true;
        backend
    }

    /// Create a mock backend that will fail during inference
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::new();
        backend.should_fail_inference = true;
        backend
    }

    /// Create a mock backend that returns zeros of a fixed shape
    #[must_use]
    pub fn with_output_shape(shape: (usize, usize, usize, usize)) -> Self {
        let mut backend = Self::new();
        backend.output_shape_override = Some(shape);
        backend
    }

    /// Shared handle to the call history, usable after the backend is boxed
    #[must_use]
    pub fn call_history_handle(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.call_history)
    }

    fn record(&self, call: &str) {
        self.call_history.lock().unwrap().push(call.to_string());
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InferenceBackend for MockBackend {
    fn initialize(&mut self, _config: &RemovalConfig) -> Result<Option<Duration>> {
        self.record("initialize");
        if self.should_fail_init {
            return Err(BgRemovalError::model("Mock initialization failure"));
        }
        if self.initialized {
            return Ok(None);
        }
        self.initialized = true;
        Ok(Some(Duration::from_millis(1)))
    }

    fn infer(&mut self, input: &Array4<f32>) -> Result<Array4<f32>> {
        self.record("infer");
        if !self.initialized {
            return Err(BgRemovalError::internal("Backend not initialized"));
        }
        if self.should_fail_inference {
            return Err(BgRemovalError::inference("Mock inference failure"));
        }
        if let Some(shape) = self.output_shape_override {
            return Ok(Array4::zeros(shape));
        }

        let (n, _c, h, w) = input.dim();
        let mut output = Array4::<f32>::zeros((n, 1, h, w));
        output
            .slice_mut(s![.., 0, .., ..])
            .assign(&input.slice(s![.., 0, .., ..]));
        Ok(output)
    }

    fn get_preprocessing_config(&self) -> Result<PreprocessingConfig> {
        Ok(self.preprocessing_config.clone())
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}
