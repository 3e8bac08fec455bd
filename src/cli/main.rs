//! Background Removal CLI Tool
//!
//! `bgremove <input_path> <output_path>` removes the background from one
//! image. Stdout carries exactly one status line; diagnostics go to stderr.

use super::config::CliConfigBuilder;
use crate::{
    conversion::remove_background_file,
    processor::{available_backends, BackgroundRemovalProcessor},
    services::ImageIOService,
    tracing_config::{TracingConfig, TracingFormat},
};
use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use log::{debug, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Usage line printed on stdout when the arguments are wrong
pub const USAGE: &str = "Usage: bgremove <input_path> <output_path>";

/// Environment fallbacks for flags; an empty value means unset
const ENV_FALLBACKS: [&str; 5] = [
    "BGREMOVE_EXECUTION_PROVIDER",
    "BGREMOVE_MODEL",
    "U2NET_HOME",
    "BGREMOVE_MODEL_NAME",
    "BGREMOVE_THREADS",
];

/// Background removal CLI tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "bgremove")]
pub struct Cli {
    /// Image to remove the background from (put `--` before paths starting with '-')
    #[arg(value_name = "INPUT_PATH")]
    pub input_path: PathBuf,

    /// Where to write the PNG result (parent directories are created)
    #[arg(value_name = "OUTPUT_PATH")]
    pub output_path: PathBuf,

    /// Execution provider in format backend:provider (e.g., tract:cpu, onnx:auto, onnx:cuda)
    #[arg(
        short,
        long,
        env = "BGREMOVE_EXECUTION_PROVIDER",
        default_value = "tract:cpu"
    )]
    pub execution_provider: String,

    /// Explicit ONNX model file (overrides --model-dir and --model-name)
    #[arg(short, long, env = "BGREMOVE_MODEL", value_name = "FILE")]
    pub model: Option<PathBuf>,

    /// Directory holding installed models [default: ~/.u2net]
    #[arg(long, env = "U2NET_HOME", value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Catalog model to load from the model directory
    #[arg(long, env = "BGREMOVE_MODEL_NAME", default_value = "u2net")]
    pub model_name: String,

    /// Number of inference threads, ONNX backend only (0 = auto-detect)
    #[arg(short, long, env = "BGREMOVE_THREADS", default_value_t = 0)]
    pub threads: usize,

    /// Enable verbose logging (-v: INFO, -vv: DEBUG, -vvv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn main() -> ExitCode {
    clear_empty_env_fallbacks();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return report_parse_error(&e),
    };

    // Logging is best effort; the status line contract does not depend on it
    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("warning: {e:#}");
    }

    if !cli.input_path.exists() {
        println!(
            "ERROR: Input file '{}' does not exist",
            cli.input_path.display()
        );
        return ExitCode::from(1);
    }

    if let Err(e) = ImageIOService::ensure_output_dir(&cli.output_path) {
        println!("ERROR: {e}");
        return ExitCode::from(1);
    }

    match run(&cli) {
        Ok(()) => {
            println!("SUCCESS");
            ExitCode::SUCCESS
        },
        Err(e) => {
            println!("ERROR: {}", status_message(&e));
            ExitCode::from(1)
        },
    }
}

/// Remove empty fallback variables so clap falls back to the flag default
fn clear_empty_env_fallbacks() {
    for name in ENV_FALLBACKS {
        if std::env::var_os(name).is_some_and(|value| value.is_empty()) {
            std::env::remove_var(name);
        }
    }
}

/// Join the error chain, skipping causes already quoted by an outer message
fn status_message(error: &anyhow::Error) -> String {
    let mut parts: Vec<String> = Vec::new();
    for cause in error.chain() {
        let text = cause.to_string();
        if !parts.iter().any(|part| part.contains(&text)) {
            parts.push(text);
        }
    }
    parts.join(": ")
}

/// Help and version go to stdout with exit 0; anything else is a usage error
fn report_parse_error(error: &clap::Error) -> ExitCode {
    match error.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            // Nothing useful can be done if stdout is gone
            let _ = error.print();
            ExitCode::SUCCESS
        },
        _ => {
            println!("{USAGE}");
            eprintln!("{error}");
            ExitCode::from(1)
        },
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = CliConfigBuilder::from_cli(cli)?;

    info!("Starting background removal");
    info!("Input: {}", cli.input_path.display());
    info!("Output: {}", cli.output_path.display());
    info!(
        "Backend: {}, Provider: {}",
        config.backend_type, config.execution_provider
    );
    info!("Model: {}", config.model_spec.source.display_name());
    debug!("Compiled backends: {:?}", available_backends());

    let start_time = Instant::now();
    let mut processor = BackgroundRemovalProcessor::new(config)
        .context("Failed to create background removal processor")?;

    remove_background_file(&cli.input_path, &cli.output_path, &mut processor)?;

    info!(
        "Processed {} in {:.2}s",
        cli.input_path.display(),
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    let format = if std::env::var_os("CI").is_some() {
        TracingFormat::Compact
    } else {
        TracingFormat::Console
    };

    TracingConfig::new()
        .with_verbosity(verbose_count)
        .with_format(format)
        .init()
        .context("Failed to initialize tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_positional_arguments_parse() {
        let cli = Cli::try_parse_from(["bgremove", "in.jpg", "out/cut.png"]).unwrap();
        assert_eq!(cli.input_path, PathBuf::from("in.jpg"));
        assert_eq!(cli.output_path, PathBuf::from("out/cut.png"));
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_wrong_argument_counts_are_usage_errors() {
        for argv in [
            vec!["bgremove"],
            vec!["bgremove", "in.jpg"],
            vec!["bgremove", "a.jpg", "b.png", "c.png"],
        ] {
            let err = Cli::try_parse_from(&argv).unwrap_err();
            assert!(
                !matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion),
                "{argv:?} should be a usage error"
            );
        }
    }

    #[test]
    fn test_help_is_not_a_usage_error() {
        let err = Cli::try_parse_from(["bgremove", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_verbosity_counts() {
        let cli = Cli::try_parse_from(["bgremove", "-vv", "in.jpg", "out.png"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_double_dash_allows_hyphen_paths() {
        let cli = Cli::try_parse_from(["bgremove", "--", "-x.png", "out.png"]).unwrap();
        assert_eq!(cli.input_path, PathBuf::from("-x.png"));
    }

    #[test]
    fn test_status_message_does_not_repeat_sources() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let error = anyhow::Error::from(crate::error::BgRemovalError::file_io_error(
            "read input file",
            "in.png",
            &io_error,
        ));
        let message = status_message(&error);
        assert_eq!(message.matches("gone").count(), 1, "{message}");
        assert!(message.starts_with("IO error: Failed to read input file 'in.png'"));
    }

    #[test]
    fn test_status_message_keeps_context() {
        let error = anyhow::Error::from(crate::error::BgRemovalError::model("no weights"))
            .context("Failed to create background removal processor");
        assert_eq!(
            status_message(&error),
            "Failed to create background removal processor: Model error: no weights"
        );
    }

    #[test]
    fn test_usage_line() {
        assert_eq!(USAGE, "Usage: bgremove <input_path> <output_path>");
    }
}
