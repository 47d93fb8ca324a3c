//! CLI subcommand handlers.

use crate::Commands;
use anyhow::Context;
use footprint_core::config::FootprintConfig;
use footprint_core::error::ServiceError;
use footprint_core::features::EncoderStore;
use footprint_core::gateway;
use footprint_core::record::{StructuredRecord, record_schema};
use footprint_core::service::bootstrap;
use std::path::Path;
use std::sync::Arc;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: FootprintConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve { host, port } => handle_serve(config, workspace, host, port).await,
        Commands::FitEncoder => handle_fit_encoder(&config, workspace).await,
        Commands::Predict { file } => handle_predict(&config, workspace, &file).await,
        Commands::Schema => handle_schema(),
    }
}

async fn handle_serve(
    mut config: FootprintConfig,
    workspace: &Path,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let artifacts = config.artifacts.resolve(workspace);
    let service = bootstrap(&artifacts)
        .await
        .context("Failed to initialize prediction service")?;
    gateway::run(Arc::new(service), &config.server)
        .await
        .with_context(|| format!("Server error on {}", config.server.addr()))
}

async fn handle_fit_encoder(config: &FootprintConfig, workspace: &Path) -> anyhow::Result<()> {
    let artifacts = config.artifacts.resolve(workspace);
    let store = EncoderStore::with_csv(&artifacts.encoder_path, &artifacts.dataset_path);
    let encoder = store.rebuild().await.with_context(|| {
        format!(
            "Failed to fit encoder from {}",
            artifacts.dataset_path.display()
        )
    })?;

    println!("Encoder written to {}", store.artifact_path().display());
    println!("  rows:        {}", encoder.fitted_rows());
    println!("  features:    {}", encoder.width());
    println!("  fingerprint: {}", encoder.fingerprint());
    Ok(())
}

async fn handle_predict(
    config: &FootprintConfig,
    workspace: &Path,
    file: &Path,
) -> anyhow::Result<()> {
    let content =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let record: StructuredRecord = serde_json::from_slice(&content)
        .with_context(|| format!("{} is not a valid record", file.display()))?;

    let artifacts = config.artifacts.resolve(workspace);
    let service = bootstrap(&artifacts)
        .await
        .context("Failed to initialize prediction service")?;

    match service.predict(record) {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Err(ServiceError::Validation(errors)) => {
            for error in &errors {
                eprintln!("  {}: {}", error.field, error.message);
            }
            anyhow::bail!("{} field(s) failed validation", errors.len())
        }
        Err(e) => Err(e.into()),
    }
}

fn handle_schema() -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&record_schema())?);
    Ok(())
}
