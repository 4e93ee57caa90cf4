//! Server configuration.

use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Runtime configuration, read from `config/server.toml` when present.
///
/// Every field has a default so the server also runs with no file at all,
/// matching how the original service was deployed.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Path to the frozen ONNX classifier weights.
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Upper bound on a single inference, in milliseconds.
    #[serde(default = "default_inference_timeout_ms")]
    pub inference_timeout_ms: u64,
    /// Upper bound on an uploaded payload, in bytes.
    #[serde(default = "default_max_payload_bytes")]
    pub max_payload_bytes: usize,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_model_path() -> String {
    "mnist.onnx".to_string()
}

fn default_inference_timeout_ms() -> u64 {
    5000
}

fn default_max_payload_bytes() -> usize {
    1024 * 1024
}

impl ServerConfig {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/server.toml")
    }

    /// Load configuration from a specific path, falling back to defaults
    /// when the file does not exist.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let config = Config::builder()
            .add_source(File::from(path))
            .build()
            .context("failed to build configuration")?;

        config
            .try_deserialize()
            .context("failed to deserialize configuration")
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            model_path: default_model_path(),
            inference_timeout_ms: default_inference_timeout_ms(),
            max_payload_bytes: default_max_payload_bytes(),
        }
    }
}
