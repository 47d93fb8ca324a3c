//! # HTTP Gateway
//!
//! JSON-over-HTTP surface for the prediction service: `POST /predict`,
//! `GET /health`, and `GET /schema`.

mod server;

pub use server::{router, run};

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Attach a permissive CORS layer for browser UIs served elsewhere.
    pub cors_allow_any: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9696,
            cors_allow_any: false,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
