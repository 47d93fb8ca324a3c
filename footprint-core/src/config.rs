//! Configuration system for the footprint service.
//!
//! Uses `figment` for layered configuration: defaults → user config →
//! workspace config → explicit file → environment variables.

use crate::gateway::ServerConfig;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FootprintConfig {
    pub server: ServerConfig,
    pub artifacts: ArtifactConfig,
    pub logging: LoggingConfig,
}

/// Locations of the model, encoder, and reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    /// Serialized regression model (JSON, tagged by `kind`).
    pub model_path: PathBuf,
    /// Persisted encoder artifact; created on first start if absent.
    pub encoder_path: PathBuf,
    /// Reference CSV the encoder is fit against.
    pub dataset_path: PathBuf,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model.json"),
            encoder_path: PathBuf::from("encoder.json"),
            dataset_path: PathBuf::from("Carbon Emission.csv"),
        }
    }
}

impl ArtifactConfig {
    /// Resolve relative paths against `base`. Absolute paths are kept.
    pub fn resolve(&self, base: &Path) -> Self {
        let join = |p: &Path| {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base.join(p)
            }
        };
        Self {
            model_path: join(&self.model_path),
            encoder_path: join(&self.encoder_path),
            dataset_path: join(&self.dataset_path),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write JSON logs to a daily-rolling file alongside stderr output.
    pub file_logging: bool,
    /// Log directory; defaults to the platform data dir.
    pub log_dir: Option<PathBuf>,
    /// Filter directive used when neither `RUST_LOG` nor `-v`/`-q` is given.
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file_logging: true,
            log_dir: None,
            level: None,
        }
    }
}

/// Platform project directories (`~/.config/footprint` and friends).
pub fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("dev", "footprint", "footprint")
}

/// Load configuration with layered sources.
///
/// Priority (highest wins):
/// 1. `FOOTPRINT_*` environment variables (`FOOTPRINT_SERVER__PORT`, ...)
/// 2. `config_file`, when given
/// 3. `<workspace>/.footprint/config.toml`
/// 4. User config (`~/.config/footprint/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    workspace: Option<&Path>,
    config_file: Option<&Path>,
) -> Result<FootprintConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(FootprintConfig::default()));

    if let Some(dirs) = project_dirs() {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(".footprint").join("config.toml");
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(file) = config_file {
        figment = figment.merge(Toml::file_exact(file));
    }

    figment = figment.merge(Env::prefixed("FOOTPRINT_").split("__"));

    figment.extract().map_err(Box::new)
}
