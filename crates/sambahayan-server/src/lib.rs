//! Server wiring for the household suggestion engine: configuration and the
//! HTTP semantic-filter client. The binary lives in `main.rs`.

pub mod semantic;

use std::path::{Path, PathBuf};

use sambahayan_engine::EngineConfig;
use serde::Deserialize;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` layered with
/// `SAMBAHAYAN_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  /// Endpoint of the semantic filter. Stage two is disabled when unset.
  #[serde(default)]
  pub semantic_filter_url: Option<String>,
  #[serde(default)]
  pub engine:              EngineConfig,
}

/// Environment overrides: `SAMBAHAYAN_` prefix, `__` between nested keys,
/// e.g. `SAMBAHAYAN_PORT=9000` or `SAMBAHAYAN_ENGINE__INCLUSION_FLOOR=85`.
pub fn env_source() -> config::Environment {
  config::Environment::with_prefix("SAMBAHAYAN")
    .prefix_separator("_")
    .separator("__")
}

/// Layer `env` over the optional TOML file at `path`.
pub fn load_config(
  path: &Path,
  env: config::Environment,
) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

fn default_host() -> String { "127.0.0.1".to_string() }

fn default_port() -> u16 { 8080 }
