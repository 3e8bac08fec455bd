//! Model catalog and on-disk model resolution
//!
//! Models are never downloaded. A model is either an explicit ONNX file or a
//! catalog entry looked up as `<model_dir>/<name>.onnx`, where `model_dir`
//! defaults to `~/.u2net`.

use crate::error::{BgRemovalError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Directory under the home directory that holds installed models
pub const DEFAULT_MODEL_DIR_NAME: &str = ".u2net";

/// Pre-trained segmentation models this crate knows how to preprocess for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    /// General purpose U2-Net
    #[default]
    #[serde(rename = "u2net")]
    U2net,
    /// Lightweight U2-Net
    #[serde(rename = "u2netp")]
    U2netp,
    /// U2-Net trained for human segmentation
    #[serde(rename = "u2net_human_seg")]
    U2netHumanSeg,
    /// Reduced-size U2-Net
    #[serde(rename = "silueta")]
    Silueta,
    /// `IS-Net` general use
    #[serde(rename = "isnet-general-use")]
    IsnetGeneralUse,
}

impl ModelKind {
    pub const ALL: [ModelKind; 5] = [
        ModelKind::U2net,
        ModelKind::U2netp,
        ModelKind::U2netHumanSeg,
        ModelKind::Silueta,
        ModelKind::IsnetGeneralUse,
    ];

    /// Catalog name, also the model file stem
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::U2net => "u2net",
            Self::U2netp => "u2netp",
            Self::U2netHumanSeg => "u2net_human_seg",
            Self::Silueta => "silueta",
            Self::IsnetGeneralUse => "isnet-general-use",
        }
    }

    #[must_use]
    pub fn file_name(self) -> String {
        format!("{}.onnx", self.name())
    }

    /// Preprocessing the model was trained with
    #[must_use]
    pub fn preprocessing_config(self) -> PreprocessingConfig {
        match self {
            Self::U2net | Self::U2netp | Self::U2netHumanSeg | Self::Silueta => {
                PreprocessingConfig {
                    target_size: [320, 320],
                    normalization_mean: [0.485, 0.456, 0.406],
                    normalization_std: [0.229, 0.224, 0.225],
                }
            },
            Self::IsnetGeneralUse => PreprocessingConfig {
                target_size: [1024, 1024],
                normalization_mean: [0.5, 0.5, 0.5],
                normalization_std: [1.0, 1.0, 1.0],
            },
        }
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = BgRemovalError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|kind| kind.name()).collect();
                BgRemovalError::invalid_config(format!(
                    "Unknown model name '{s}'. Known models: {}",
                    known.join(", ")
                ))
            })
    }
}

/// Model source specification
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    /// Explicit ONNX file on disk
    External(PathBuf),
    /// Catalog model inside a model directory (`None` = `~/.u2net`)
    Installed { model_dir: Option<PathBuf> },
}

impl ModelSource {
    /// Get a display name for tracing and logging
    #[must_use]
    pub fn display_name(&self) -> String {
        match self {
            ModelSource::External(path) => {
                format!(
                    "external:{}",
                    path.file_name().unwrap_or_default().to_string_lossy()
                )
            },
            ModelSource::Installed { model_dir: Some(dir) } => {
                format!("installed:{}", dir.display())
            },
            ModelSource::Installed { model_dir: None } => "installed:default".to_string(),
        }
    }
}

/// Complete model specification: where the weights live and how to feed them
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub source: ModelSource,
    pub kind: ModelKind,
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            source: ModelSource::Installed { model_dir: None },
            kind: ModelKind::default(),
        }
    }
}

impl ModelSpec {
    /// Path of the ONNX file this spec points at
    ///
    /// # Errors
    /// - No model directory given and the home directory cannot be determined
    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.source {
            ModelSource::External(path) => Ok(path.clone()),
            ModelSource::Installed { model_dir } => {
                let dir = match model_dir {
                    Some(dir) => dir.clone(),
                    None => default_model_dir()?,
                };
                Ok(dir.join(self.kind.file_name()))
            },
        }
    }
}

/// `~/.u2net`
///
/// # Errors
/// - Home directory cannot be determined
pub fn default_model_dir() -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(DEFAULT_MODEL_DIR_NAME))
        .ok_or_else(|| {
            BgRemovalError::model(
                "Cannot determine home directory for the default model location. Set U2NET_HOME or pass --model",
            )
        })
}

/// Image preprocessing parameters for a model
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessingConfig {
    /// Input tensor size as `[width, height]`
    pub target_size: [u32; 2],
    pub normalization_mean: [f32; 3],
    pub normalization_std: [f32; 3],
}

/// Model information and metadata
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub size_bytes: u64,
    pub input_shape: (usize, usize, usize, usize), // NCHW format
    pub output_shape: (usize, usize, usize, usize),
}

#[derive(Debug, Deserialize)]
struct Sidecar {
    preprocessing: SidecarPreprocessing,
}

#[derive(Debug, Deserialize)]
struct SidecarPreprocessing {
    target_size: [u32; 2],
    normalization: SidecarNormalization,
}

#[derive(Debug, Deserialize)]
struct SidecarNormalization {
    mean: [f32; 3],
    std: [f32; 3],
}

/// Resolved model file plus the preprocessing that goes with it
#[derive(Debug, Clone)]
pub struct ModelManager {
    model_path: PathBuf,
    kind: ModelKind,
    preprocessing: PreprocessingConfig,
}

impl ModelManager {
    /// Resolve a model specification to a file on disk
    ///
    /// # Errors
    /// - Model file does not exist or is not a regular file
    /// - Sidecar JSON exists but cannot be read, parsed or validated
    pub fn from_spec(spec: &ModelSpec) -> Result<Self> {
        let model_path = spec.resolve_path()?;

        if !model_path.is_file() {
            return Err(BgRemovalError::model_error_with_context(
                "locate",
                &model_path,
                "file not found",
                &[
                    "place the ONNX file in the model directory",
                    "set U2NET_HOME",
                    "pass --model <FILE>",
                ],
            ));
        }

        let preprocessing = match Self::load_sidecar(&model_path)? {
            Some(config) => {
                log::debug!(
                    "Using sidecar preprocessing for {}: {:?}",
                    model_path.display(),
                    config
                );
                config
            },
            None => spec.kind.preprocessing_config(),
        };

        Ok(Self {
            model_path,
            kind: spec.kind,
            preprocessing,
        })
    }

    /// Preprocessing override stored next to the model as `<stem>.json`
    fn load_sidecar(model_path: &Path) -> Result<Option<PreprocessingConfig>> {
        let sidecar_path = model_path.with_extension("json");
        if !sidecar_path.is_file() {
            return Ok(None);
        }

        let content = fs::read_to_string(&sidecar_path).map_err(|e| {
            BgRemovalError::file_io_error("read model sidecar", &sidecar_path, &e)
        })?;
        let sidecar: Sidecar = serde_json::from_str(&content).map_err(|e| {
            BgRemovalError::invalid_config(format!(
                "Failed to parse {}: {e}",
                sidecar_path.display()
            ))
        })?;

        let preprocessing = sidecar.preprocessing;
        if preprocessing.target_size.contains(&0) {
            return Err(BgRemovalError::invalid_config(format!(
                "target_size in {} must be positive, got {:?}",
                sidecar_path.display(),
                preprocessing.target_size
            )));
        }
        if preprocessing
            .normalization
            .std
            .iter()
            .any(|std| *std == 0.0 || !std.is_finite())
        {
            return Err(BgRemovalError::invalid_config(format!(
                "normalization std in {} must be finite and non-zero",
                sidecar_path.display()
            )));
        }

        Ok(Some(PreprocessingConfig {
            target_size: preprocessing.target_size,
            normalization_mean: preprocessing.normalization.mean,
            normalization_std: preprocessing.normalization.std,
        }))
    }

    /// Read the model weights
    ///
    /// # Errors
    /// - File I/O errors when reading model data
    pub fn load_model(&self) -> Result<Vec<u8>> {
        fs::read(&self.model_path)
            .map_err(|e| BgRemovalError::file_io_error("read model file", &self.model_path, &e))
    }

    /// Get model information
    ///
    /// # Errors
    /// - Model file metadata cannot be read
    pub fn get_info(&self) -> Result<ModelInfo> {
        let size_bytes = fs::metadata(&self.model_path)
            .map_err(|e| BgRemovalError::file_io_error("inspect model file", &self.model_path, &e))?
            .len();
        let [width, height] = self.preprocessing.target_size;

        Ok(ModelInfo {
            name: self.kind.name().to_string(),
            size_bytes,
            input_shape: (1, 3, height as usize, width as usize),
            output_shape: (1, 1, height as usize, width as usize),
        })
    }

    #[must_use]
    pub fn preprocessing_config(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }

    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    #[must_use]
    pub fn kind(&self) -> ModelKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn installed_spec(dir: &Path, kind: ModelKind) -> ModelSpec {
        ModelSpec {
            source: ModelSource::Installed {
                model_dir: Some(dir.to_path_buf()),
            },
            kind,
        }
    }

    #[test]
    fn test_model_kind_names_round_trip() {
        for kind in ModelKind::ALL {
            assert_eq!(kind.name().parse::<ModelKind>().unwrap(), kind);
            assert_eq!(kind.to_string(), kind.name());
        }
        assert_eq!(ModelKind::IsnetGeneralUse.file_name(), "isnet-general-use.onnx");
    }

    #[test]
    fn test_unknown_model_name_lists_known_models() {
        let err = "u3net".parse::<ModelKind>().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("u3net"));
        assert!(message.contains("u2netp"));
        assert!(message.contains("isnet-general-use"));
    }

    #[test]
    fn test_catalog_preprocessing() {
        let u2net = ModelKind::U2net.preprocessing_config();
        assert_eq!(u2net.target_size, [320, 320]);
        assert_eq!(u2net.normalization_mean, [0.485, 0.456, 0.406]);
        assert_eq!(u2net.normalization_std, [0.229, 0.224, 0.225]);

        let isnet = ModelKind::IsnetGeneralUse.preprocessing_config();
        assert_eq!(isnet.target_size, [1024, 1024]);
        assert_eq!(isnet.normalization_std, [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_display_name() {
        let external = ModelSource::External(PathBuf::from("/opt/models/custom.onnx"));
        assert_eq!(external.display_name(), "external:custom.onnx");

        let default_dir = ModelSource::Installed { model_dir: None };
        assert_eq!(default_dir.display_name(), "installed:default");
    }

    #[test]
    fn test_resolve_path_installed_and_external() {
        let spec = installed_spec(Path::new("/srv/models"), ModelKind::Silueta);
        assert_eq!(
            spec.resolve_path().unwrap(),
            PathBuf::from("/srv/models/silueta.onnx")
        );

        let spec = ModelSpec {
            source: ModelSource::External(PathBuf::from("/tmp/any-name.onnx")),
            kind: ModelKind::U2net,
        };
        assert_eq!(spec.resolve_path().unwrap(), PathBuf::from("/tmp/any-name.onnx"));
    }

    #[test]
    fn test_missing_model_file_is_model_error() {
        let temp_dir = TempDir::new().unwrap();
        let spec = installed_spec(temp_dir.path(), ModelKind::U2net);

        let err = ModelManager::from_spec(&spec).unwrap_err();
        assert!(matches!(err, BgRemovalError::Model(_)));
        assert!(err.to_string().contains("u2net.onnx"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_manager_uses_catalog_preprocessing_without_sidecar() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("u2netp.onnx"), b"weights").unwrap();

        let manager =
            ModelManager::from_spec(&installed_spec(temp_dir.path(), ModelKind::U2netp)).unwrap();
        assert_eq!(manager.kind(), ModelKind::U2netp);
        assert_eq!(
            manager.preprocessing_config(),
            &ModelKind::U2netp.preprocessing_config()
        );
        assert_eq!(manager.load_model().unwrap(), b"weights");

        let info = manager.get_info().unwrap();
        assert_eq!(info.name, "u2netp");
        assert_eq!(info.size_bytes, 7);
        assert_eq!(info.input_shape, (1, 3, 320, 320));
        assert_eq!(info.output_shape, (1, 1, 320, 320));
    }

    #[test]
    fn test_sidecar_overrides_preprocessing() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("custom.onnx");
        fs::write(&model_path, b"weights").unwrap();
        fs::write(
            temp_dir.path().join("custom.json"),
            r#"{"preprocessing": {"target_size": [512, 256],
                "normalization": {"mean": [0.5, 0.5, 0.5], "std": [0.25, 0.25, 0.25]}}}"#,
        )
        .unwrap();

        let spec = ModelSpec {
            source: ModelSource::External(model_path),
            kind: ModelKind::U2net,
        };
        let manager = ModelManager::from_spec(&spec).unwrap();
        let config = manager.preprocessing_config();
        assert_eq!(config.target_size, [512, 256]);
        assert_eq!(config.normalization_std, [0.25, 0.25, 0.25]);

        // NCHW: height comes before width
        assert_eq!(manager.get_info().unwrap().input_shape, (1, 3, 256, 512));
    }

    #[test]
    fn test_invalid_sidecar_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let model_path = temp_dir.path().join("custom.onnx");
        fs::write(&model_path, b"weights").unwrap();
        let spec = ModelSpec {
            source: ModelSource::External(model_path),
            kind: ModelKind::U2net,
        };

        fs::write(temp_dir.path().join("custom.json"), "{not json").unwrap();
        assert!(matches!(
            ModelManager::from_spec(&spec).unwrap_err(),
            BgRemovalError::InvalidConfig(_)
        ));

        fs::write(
            temp_dir.path().join("custom.json"),
            r#"{"preprocessing": {"target_size": [0, 320],
                "normalization": {"mean": [0.5, 0.5, 0.5], "std": [1.0, 1.0, 1.0]}}}"#,
        )
        .unwrap();
        assert!(ModelManager::from_spec(&spec)
            .unwrap_err()
            .to_string()
            .contains("target_size"));

        fs::write(
            temp_dir.path().join("custom.json"),
            r#"{"preprocessing": {"target_size": [320, 320],
                "normalization": {"mean": [0.5, 0.5, 0.5], "std": [1.0, 0.0, 1.0]}}}"#,
        )
        .unwrap();
        assert!(ModelManager::from_spec(&spec)
            .unwrap_err()
            .to_string()
            .contains("std"));
    }
}
