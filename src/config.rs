//! Configuration types for background removal operations

use crate::{
    error::{BgRemovalError, Result},
    models::ModelSpec,
    processor::BackendType,
};
use serde::{Deserialize, Serialize};

/// Execution provider options for ONNX Runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExecutionProvider {
    /// Auto-detect best available provider (CUDA > `CoreML` > CPU)
    #[default]
    Auto,
    /// CPU execution (always available)
    Cpu,
    /// NVIDIA CUDA GPU acceleration
    Cuda,
    /// Apple Silicon acceleration
    CoreMl,
}

impl std::fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Cpu => write!(f, "cpu"),
            Self::Cuda => write!(f, "cuda"),
            Self::CoreMl => write!(f, "coreml"),
        }
    }
}

/// Configuration for background removal operations
#[derive(Debug, Clone, PartialEq)]
pub struct RemovalConfig {
    /// Inference backend
    pub backend_type: BackendType,

    /// Execution provider (only meaningful for the ONNX backend)
    pub execution_provider: ExecutionProvider,

    /// Which model to load and where to find it
    pub model_spec: ModelSpec,

    /// Number of intra-op threads for inference (0 = auto)
    pub intra_threads: usize,
}

impl Default for RemovalConfig {
    fn default() -> Self {
        Self {
            backend_type: BackendType::Tract,
            execution_provider: ExecutionProvider::Cpu,
            model_spec: ModelSpec::default(),
            intra_threads: 0,
        }
    }
}

impl RemovalConfig {
    /// Create a new configuration builder
    ///
    /// ```rust
    /// use bgremove::{BackendType, ExecutionProvider, RemovalConfig};
    ///
    /// let config = RemovalConfig::builder()
    ///     .backend_type(BackendType::Onnx)
    ///     .execution_provider(ExecutionProvider::Auto)
    ///     .intra_threads(4)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.intra_threads, 4);
    /// ```
    #[must_use]
    pub fn builder() -> RemovalConfigBuilder {
        RemovalConfigBuilder::default()
    }

    /// Check that the backend and execution provider are compatible
    ///
    /// # Errors
    /// - Tract backend combined with a non-CPU execution provider
    pub fn validate(&self) -> Result<()> {
        if self.backend_type == BackendType::Tract
            && self.execution_provider != ExecutionProvider::Cpu
        {
            return Err(BgRemovalError::invalid_config(format!(
                "Tract backend only supports the cpu execution provider, got '{}'",
                self.execution_provider
            )));
        }

        Ok(())
    }
}

/// Builder for `RemovalConfig`
#[derive(Debug, Default)]
pub struct RemovalConfigBuilder {
    config: RemovalConfig,
}

impl RemovalConfigBuilder {
    /// Set inference backend
    #[must_use]
    pub fn backend_type(mut self, backend_type: BackendType) -> Self {
        self.config.backend_type = backend_type;
        self
    }

    /// Set execution provider
    #[must_use]
    pub fn execution_provider(mut self, provider: ExecutionProvider) -> Self {
        self.config.execution_provider = provider;
        self
    }

    /// Set model specification
    #[must_use]
    pub fn model_spec(mut self, model_spec: ModelSpec) -> Self {
        self.config.model_spec = model_spec;
        self
    }

    /// Set number of intra-op threads
    #[must_use]
    pub fn intra_threads(mut self, threads: usize) -> Self {
        self.config.intra_threads = threads;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    /// - Backend and execution provider combination is invalid
    pub fn build(self) -> Result<RemovalConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
