//! Background removal processor
//!
//! `BackgroundRemovalProcessor` owns the inference backend and runs the
//! decode, preprocess, infer, mask and cutout stages for one image at a time.
//! The backend and its model are created lazily on first use.

use crate::{
    config::RemovalConfig,
    conversion::BackgroundRemover,
    error::{BgRemovalError, Result},
    inference::InferenceBackend,
    models::ModelManager,
    types::SegmentationMask,
    utils::ImagePreprocessor,
};
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader, RgbaImage};
use log::{debug, info};
use ndarray::{s, Array4};
use std::io::Cursor;
use std::time::Instant;
use tracing::{info as trace_info, instrument, span, Level};

/// Backend type enumeration for runtime selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// ONNX Runtime backend (supports GPU acceleration)
    Onnx,
    /// Tract backend (pure Rust, no external dependencies)
    Tract,
}

impl std::fmt::Display for BackendType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Onnx => write!(f, "onnx"),
            Self::Tract => write!(f, "tract"),
        }
    }
}

/// Create a backend of the requested type for a resolved model
///
/// # Errors
/// - The backend was not compiled into this build
pub fn create_backend(
    backend_type: BackendType,
    model_manager: ModelManager,
) -> Result<Box<dyn InferenceBackend>> {
    match backend_type {
        #[cfg(feature = "onnx")]
        BackendType::Onnx => Ok(Box::new(crate::backends::OnnxBackend::with_model_manager(
            model_manager,
        ))),
        #[cfg(not(feature = "onnx"))]
        BackendType::Onnx => Err(BgRemovalError::invalid_config(format!(
            "ONNX backend is not available in this build (model '{}'); rebuild with --features onnx",
            model_manager.model_path().display()
        ))),
        #[cfg(feature = "tract")]
        BackendType::Tract => Ok(Box::new(
            crate::backends::TractBackend::with_model_manager(model_manager),
        )),
        #[cfg(not(feature = "tract"))]
        BackendType::Tract => Err(BgRemovalError::invalid_config(format!(
            "Tract backend is not available in this build (model '{}'); rebuild with --features tract",
            model_manager.model_path().display()
        ))),
    }
}

/// Backends compiled into this build
#[must_use]
pub fn available_backends() -> Vec<BackendType> {
    let mut backends = Vec::new();
    if cfg!(feature = "tract") {
        backends.push(BackendType::Tract);
    }
    if cfg!(feature = "onnx") {
        backends.push(BackendType::Onnx);
    }
    backends
}

/// Runs background removal with a lazily initialized backend
pub struct BackgroundRemovalProcessor {
    config: RemovalConfig,
    backend: Option<Box<dyn InferenceBackend>>,
    initialized: bool,
}

impl BackgroundRemovalProcessor {
    /// Create a processor; the model is resolved and loaded on first use
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn new(config: RemovalConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend: None,
            initialized: false,
        })
    }

    /// Create a processor around an already constructed backend
    ///
    /// # Errors
    /// - Invalid configuration
    pub fn with_backend(config: RemovalConfig, backend: Box<dyn InferenceBackend>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            backend: Some(backend),
            initialized: false,
        })
    }

    /// Resolve the model, create the backend and load the model
    ///
    /// Calling this again after a successful initialization is a no-op.
    ///
    /// # Errors
    /// - Model file missing or invalid
    /// - Backend not compiled in
    /// - Backend initialization failures
    pub fn initialize(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        info!("Initializing background removal processor");
        debug!("Model: {}", self.config.model_spec.source.display_name());
        debug!("Backend type: {}", self.config.backend_type);
        debug!("Execution provider: {}", self.config.execution_provider);

        if self.backend.is_none() {
            let model_manager = ModelManager::from_spec(&self.config.model_spec)?;
            let model_info = model_manager.get_info()?;
            info!(
                "Using model {} ({:.1} MB) from {}",
                model_info.name,
                model_info.size_bytes as f64 / (1024.0 * 1024.0),
                model_manager.model_path().display()
            );
            debug!("Model input shape: {:?}", model_info.input_shape);
            self.backend = Some(create_backend(self.config.backend_type, model_manager)?);
        }
        let backend = self
            .backend
            .as_mut()
            .ok_or_else(|| BgRemovalError::internal("Backend missing after creation"))?;

        if let Some(model_load_time) = backend.initialize(&self.config)? {
            debug!("Model loaded in {}ms", model_load_time.as_millis());
        }

        self.initialized = true;
        info!("Background removal processor initialized successfully");
        Ok(())
    }

    /// Remove the background from a decoded image
    ///
    /// # Errors
    /// - Initialization, preprocessing, inference or mask errors
    #[instrument(
        skip(self, image),
        fields(
            backend = %self.config.backend_type,
            model = %self.config.model_spec.source.display_name(),
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<RgbaImage> {
        self.initialize()?;

        let total_start = Instant::now();
        let original_dimensions = (image.width(), image.height());

        let input_tensor = {
            let _span = span!(
                Level::DEBUG,
                "preprocessing",
                original_width = %original_dimensions.0,
                original_height = %original_dimensions.1
            )
            .entered();
            let backend = self.backend()?;
            let preprocessing_config = backend.get_preprocessing_config()?;
            ImagePreprocessor::preprocess_for_inference(image, &preprocessing_config)?
        };

        let output_tensor = {
            let _span = span!(
                Level::INFO,
                "inference",
                backend = %self.config.backend_type
            )
            .entered();
            self.backend_mut()?.infer(&input_tensor)?
        };

        let result = {
            let _span = span!(
                Level::DEBUG,
                "background_removal",
                width = %original_dimensions.0,
                height = %original_dimensions.1
            )
            .entered();
            let mask = Self::tensor_to_mask(&output_tensor, original_dimensions)?;
            debug!("Foreground ratio: {:.3}", mask.foreground_ratio());
            mask.apply_to_image(&image.to_rgba8())?
        };

        trace_info!(
            total_ms = total_start.elapsed().as_millis() as u64,
            "Background removal complete"
        );

        Ok(result)
    }

    /// Remove the background from encoded image bytes, returning PNG bytes
    ///
    /// # Errors
    /// - Unrecognized, unsupported or corrupt image data
    /// - Any error from [`Self::process_image`]
    /// - PNG encoding failures
    pub fn process_bytes(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        let image = decode_image(image_bytes)?;
        let result = self.process_image(&image)?;

        let mut png_bytes = Vec::new();
        DynamicImage::ImageRgba8(result)
            .write_to(&mut Cursor::new(&mut png_bytes), ImageFormat::Png)?;

        debug!("Encoded {} bytes of PNG output", png_bytes.len());
        Ok(png_bytes)
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &RemovalConfig {
        &self.config
    }

    /// Check if the processor is initialized
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn backend(&self) -> Result<&dyn InferenceBackend> {
        self.backend
            .as_deref()
            .ok_or_else(|| BgRemovalError::processing("Backend not initialized"))
    }

    fn backend_mut(&mut self) -> Result<&mut Box<dyn InferenceBackend>> {
        self.backend
            .as_mut()
            .ok_or_else(|| BgRemovalError::processing("Backend not initialized"))
    }

    /// Convert the model output into a mask at the original image size
    fn tensor_to_mask(
        tensor: &Array4<f32>,
        original_dimensions: (u32, u32),
    ) -> Result<SegmentationMask> {
        Self::validate_tensor_shape(tensor)?;

        let (_, _, height, width) = tensor.dim();
        let scores: Vec<f32> = tensor.slice(s![0, 0, .., ..]).iter().copied().collect();

        let mask_width = u32::try_from(width)
            .map_err(|_| BgRemovalError::processing("Mask width out of range"))?;
        let mask_height = u32::try_from(height)
            .map_err(|_| BgRemovalError::processing("Mask height out of range"))?;

        let mask = SegmentationMask::from_scores(&scores, (mask_width, mask_height))?;
        mask.resize(original_dimensions.0, original_dimensions.1)
    }

    /// Validate tensor shape for mask generation
    fn validate_tensor_shape(tensor: &Array4<f32>) -> Result<()> {
        let (batch, channels, height, width) = tensor.dim();
        if batch != 1 || channels == 0 || height == 0 || width == 0 {
            return Err(BgRemovalError::processing(format!(
                "Invalid output tensor shape {:?}, expected [1, 1, h, w]",
                tensor.shape()
            )));
        }
        Ok(())
    }
}

impl BackgroundRemover for BackgroundRemovalProcessor {
    fn remove(&mut self, image_bytes: &[u8]) -> Result<Vec<u8>> {
        self.process_bytes(image_bytes)
    }
}

/// Decode image bytes with format sniffing and EXIF orientation applied
///
/// # Errors
/// - Unrecognized or unsupported format
/// - Corrupt image data
pub fn decode_image(image_bytes: &[u8]) -> Result<DynamicImage> {
    let reader = ImageReader::new(Cursor::new(image_bytes)).with_guessed_format()?;
    let format = reader
        .format()
        .ok_or_else(|| BgRemovalError::processing("Unrecognized image format"))?;

    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation()?;
    let mut image = DynamicImage::from_decoder(decoder)?;
    image.apply_orientation(orientation);

    debug!(
        "Decoded {:?} image: {}x{} ({:?})",
        format,
        image.width(),
        image.height(),
        orientation
    );
    Ok(image)
}
