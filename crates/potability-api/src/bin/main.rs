//! Water potability server entry point

use clap::Parser;
use potability_api::cli::{self, Cli, Commands, ExitCode};
use potability_api::{init_tracing, serve, LogFormat};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let code = match &cli.command {
        Commands::Serve { .. } => {
            // The config file may pick the log format, so resolve it first.
            let config = cli::serve_config(&cli.command)?.unwrap_or_default();
            init_tracing(config.log_format);
            serve(config).await?;
            ExitCode::Success
        }
        // Offline commands write results to stdout; keep logs readable.
        Commands::Predict { model, sample } => {
            init_tracing(LogFormat::Pretty);
            cli::execute_predict(model, sample)?
        }
        Commands::InspectModel { model } => {
            init_tracing(LogFormat::Pretty);
            cli::execute_inspect(model)?
        }
    };

    if code != ExitCode::Success {
        std::process::exit(code.into());
    }

    Ok(())
}
