#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # bgremove
//!
//! Single-image background removal with U2-Net family segmentation models.
//!
//! Input bytes are decoded, run through an ONNX segmentation model, and
//! returned as a PNG whose alpha channel masks out the background. Models are
//! read from disk (`~/.u2net/<name>.onnx` by default) and never downloaded.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bgremove::{remove_background_from_bytes, RemovalConfig};
//!
//! # fn example() -> anyhow::Result<()> {
//! let input = std::fs::read("input.jpg")?;
//! let png = remove_background_from_bytes(&input, &RemovalConfig::default())?;
//! std::fs::write("output.png", png)?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): Pure Rust backend
//! - `onnx`: ONNX Runtime backend with CUDA and `CoreML` execution providers
//! - `cli` (default): `bgremove` command-line interface
//! - `webp-support` (default): WebP input decoding

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod conversion;
pub mod error;
pub mod inference;
pub mod models;
pub mod processor;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;
pub mod utils;

// Public API exports
pub use backends::*;
pub use config::{ExecutionProvider, RemovalConfig, RemovalConfigBuilder};
pub use conversion::{remove_background_file, BackgroundRemover};
pub use error::{BgRemovalError, Result};
pub use inference::InferenceBackend;
pub use models::{ModelInfo, ModelKind, ModelManager, ModelSource, ModelSpec, PreprocessingConfig};
pub use processor::{
    available_backends, create_backend, decode_image, BackendType, BackgroundRemovalProcessor,
};
pub use services::ImageIOService;
pub use types::SegmentationMask;
pub use utils::{ExecutionProviderManager, ImagePreprocessor};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};

/// Remove the background from encoded image bytes, returning PNG bytes
///
/// Builds a one-shot processor; keep a [`BackgroundRemovalProcessor`] around
/// instead when handling several images so the model is loaded once.
///
/// # Errors
/// - Invalid configuration
/// - Model missing or failing to load
/// - Undecodable image data or inference failure
pub fn remove_background_from_bytes(image_bytes: &[u8], config: &RemovalConfig) -> Result<Vec<u8>> {
    let mut processor = BackgroundRemovalProcessor::new(config.clone())?;
    processor.process_bytes(image_bytes)
}
