//! Command-line interface for the potability server
//!
//! - `serve`: run the HTTP API
//! - `predict`: one-shot offline prediction for a sample file or stdin
//! - `inspect-model`: describe a model artifact

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};

use potability_core::{load_model, validate_json, InferencePipeline, PayloadError};

use crate::config::{ConfigOverrides, LogFormat, ServerConfig};

#[derive(Debug, Parser)]
#[command(name = "potability-server")]
#[command(about = "Water potability prediction service")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// TOML configuration file
        #[arg(short, long, env = "POTABILITY_CONFIG")]
        config: Option<PathBuf>,

        /// Model artifact (JSON or YAML)
        #[arg(short, long, env = "POTABILITY_MODEL_PATH")]
        model: Option<PathBuf>,

        /// Host to bind to
        #[arg(long, env = "POTABILITY_HOST")]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Log output format
        #[arg(long, value_enum, env = "POTABILITY_LOG_FORMAT")]
        log_format: Option<LogFormat>,
    },

    /// Predict potability for a single sample
    Predict {
        /// Model artifact (JSON or YAML)
        #[arg(short, long, env = "POTABILITY_MODEL_PATH")]
        model: PathBuf,

        /// JSON sample file, or `-` for stdin
        #[arg(short, long, default_value = "-")]
        sample: String,
    },

    /// Print a summary of a model artifact
    InspectModel {
        /// Model artifact (JSON or YAML)
        #[arg(short, long, env = "POTABILITY_MODEL_PATH")]
        model: PathBuf,
    },
}

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    /// Model, I/O or inference failure
    Failure = 1,
    /// The sample did not pass validation
    ValidationError = 2,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

/// Resolve the server configuration for `serve`
pub fn serve_config(command: &Commands) -> anyhow::Result<Option<ServerConfig>> {
    let Commands::Serve {
        config,
        model,
        host,
        port,
        log_format,
    } = command
    else {
        return Ok(None);
    };

    let overrides = ConfigOverrides {
        model_path: model.clone(),
        host: host.clone(),
        port: *port,
        log_format: *log_format,
    };
    let config = ServerConfig::load(config.as_deref(), overrides)
        .context("failed to load server configuration")?;
    Ok(Some(config))
}

/// Run `predict`, printing the label on success
///
/// Validation errors are printed one per line to stderr.
pub fn execute_predict(model: &Path, sample: &str) -> anyhow::Result<ExitCode> {
    let loaded = load_model(model)
        .with_context(|| format!("failed to load model artifact {}", model.display()))?;
    let body = read_sample(sample)?;
    let pipeline = InferencePipeline::new(loaded.model);

    let sample = match validate_json(&body) {
        Ok(sample) => sample,
        Err(PayloadError::Validation(err)) => {
            for issue in err.issues() {
                eprintln!("{}: {}", issue.field, issue.message());
            }
            return Ok(ExitCode::ValidationError);
        }
        Err(PayloadError::Syntax(err)) => {
            return Err(anyhow::Error::new(err).context("sample is not valid JSON"))
        }
    };

    match pipeline.predict_sample(&sample) {
        Ok(label) => {
            println!("{}", label);
            Ok(ExitCode::Success)
        }
        Err(err) => {
            tracing::error!(error = %err, reason = err.reason(), "Model inference failed");
            eprintln!("Model inference failed: {}", err);
            Ok(ExitCode::Failure)
        }
    }
}

/// Run `inspect-model`
pub fn execute_inspect(model: &Path) -> anyhow::Result<ExitCode> {
    let loaded = load_model(model)
        .with_context(|| format!("failed to load model artifact {}", model.display()))?;
    println!("{}", serde_json::to_string_pretty(&loaded.summary)?);
    Ok(ExitCode::Success)
}

fn read_sample(source: &str) -> anyhow::Result<Vec<u8>> {
    if source == "-" {
        let mut buffer = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buffer)
            .context("failed to read sample from stdin")?;
        Ok(buffer)
    } else {
        std::fs::read(source).with_context(|| format!("failed to read sample file {}", source))
    }
}
