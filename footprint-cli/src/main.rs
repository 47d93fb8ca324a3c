//! Footprint CLI: serve and exercise the carbon footprint estimator.

mod commands;

use clap::Parser;
use footprint_core::config::{LoggingConfig, load_config, project_dirs};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Footprint: estimate annual carbon emissions from lifestyle answers
#[derive(Parser, Debug)]
#[command(name = "footprint", version, about, long_about = None)]
struct Cli {
    /// Workspace directory; relative artifact paths resolve against it
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// Load artifacts and serve the prediction API
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Refit the encoder from the reference dataset and overwrite its artifact
    FitEncoder,
    /// Score one JSON record file and print the response
    Predict {
        /// Path to a JSON record
        file: PathBuf,
    },
    /// Print the accepted fields, enumerations, and bounds as JSON
    Schema,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = load_config(Some(&workspace), cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;

    let _guard = init_tracing(&cli, &config.logging, &workspace);
    tracing::debug!(workspace = %workspace.display(), config = ?config, "Configuration loaded");

    commands::handle_command(cli.command, config, &workspace).await
}

/// Human-readable stderr output plus an optional JSON daily-rolling file.
///
/// `RUST_LOG` wins over `-v`/`-q`, which win over the configured level.
fn init_tracing(cli: &Cli, logging: &LoggingConfig, workspace: &Path) -> Option<WorkerGuard> {
    let level = match cli.verbose {
        0 if cli.quiet => "error",
        0 => logging.level.as_deref().unwrap_or("info"),
        1 => "debug",
        _ => "trace",
    };
    let stderr_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(stderr_filter);

    let (json_layer, guard) = if logging.file_logging {
        let log_dir = match &logging.log_dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => workspace.join(dir),
            None => project_dirs()
                .map(|d| d.data_dir().join("logs"))
                .unwrap_or_else(|| workspace.join("logs")),
        };
        let _ = std::fs::create_dir_all(&log_dir);
        let file_appender = tracing_appender::rolling::daily(&log_dir, "footprint.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_filter(EnvFilter::new("debug"));
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    guard
}
