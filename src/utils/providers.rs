//! Execution provider string parsing

use crate::{
    config::ExecutionProvider,
    error::{BgRemovalError, Result},
    processor::BackendType,
};

/// Utility for parsing `backend:provider` selections
pub struct ExecutionProviderManager;

impl ExecutionProviderManager {
    /// Parse execution provider string in format "backend:provider"
    ///
    /// A bare backend name selects its default provider (`onnx` = auto,
    /// `tract` = cpu).
    ///
    /// ```rust
    /// use bgremove::{BackendType, ExecutionProvider};
    /// use bgremove::utils::ExecutionProviderManager;
    ///
    /// let (backend, provider) = ExecutionProviderManager::parse_provider_string("onnx:cuda")?;
    /// assert_eq!(backend, BackendType::Onnx);
    /// assert_eq!(provider, ExecutionProvider::Cuda);
    /// # Ok::<(), bgremove::BgRemovalError>(())
    /// ```
    ///
    /// # Errors
    /// - Unknown backend or provider name
    pub fn parse_provider_string(provider_str: &str) -> Result<(BackendType, ExecutionProvider)> {
        if let Some((backend, provider)) = provider_str.split_once(':') {
            match backend {
                "onnx" => {
                    let execution_provider = match provider {
                        "auto" => ExecutionProvider::Auto,
                        "cpu" => ExecutionProvider::Cpu,
                        "cuda" => ExecutionProvider::Cuda,
                        "coreml" => ExecutionProvider::CoreMl,
                        _ => {
                            return Err(BgRemovalError::invalid_config(format!(
                                "Unknown ONNX provider: {provider}. Supported: auto, cpu, cuda, coreml"
                            )));
                        },
                    };
                    Ok((BackendType::Onnx, execution_provider))
                },
                "tract" => match provider {
                    "cpu" => Ok((BackendType::Tract, ExecutionProvider::Cpu)),
                    _ => Err(BgRemovalError::invalid_config(format!(
                        "Unknown Tract provider: {provider}. Tract only supports 'cpu'"
                    ))),
                },
                _ => Err(BgRemovalError::invalid_config(format!(
                    "Unknown backend: {backend}. Supported backends: onnx, tract"
                ))),
            }
        } else {
            match provider_str {
                "onnx" => Ok((BackendType::Onnx, ExecutionProvider::Auto)),
                "tract" => Ok((BackendType::Tract, ExecutionProvider::Cpu)),
                _ => Err(BgRemovalError::invalid_config(
                    "Invalid provider format. Use backend:provider (e.g., onnx:auto, tract:cpu)",
                )),
            }
        }
    }
}
