//! Conversion of CLI arguments into a `RemovalConfig`

use crate::cli::main_impl::Cli;
use crate::{
    config::RemovalConfig,
    models::{ModelKind, ModelSource, ModelSpec},
    utils::ExecutionProviderManager,
};
use anyhow::{Context, Result};

/// Convert CLI arguments to `RemovalConfig`
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Build `RemovalConfig` from CLI arguments
    pub(crate) fn from_cli(cli: &Cli) -> Result<RemovalConfig> {
        let model_spec = Self::model_spec(cli)?;

        let (backend_type, execution_provider) =
            ExecutionProviderManager::parse_provider_string(&cli.execution_provider)
                .context("Invalid execution provider")?;

        let config = RemovalConfig::builder()
            .model_spec(model_spec)
            .backend_type(backend_type)
            .execution_provider(execution_provider)
            .intra_threads(cli.threads)
            .build()
            .context("Invalid configuration")?;

        Ok(config)
    }

    /// Explicit model file first, then the catalog entry in the model directory
    fn model_spec(cli: &Cli) -> Result<ModelSpec> {
        let kind: ModelKind = cli
            .model_name
            .parse()
            .context("Invalid model name")?;

        let source = match &cli.model {
            Some(path) => ModelSource::External(path.clone()),
            None => ModelSource::Installed {
                model_dir: cli.model_dir.clone(),
            },
        };

        Ok(ModelSpec { source, kind })
    }
}
