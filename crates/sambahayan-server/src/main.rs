//! sambahayan server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the suggestion API over HTTP.
//!
//! # Importing registry records
//!
//! ```
//! cargo run -p sambahayan-server -- --import-persons persons.json
//! ```
//!
//! loads a JSON array of person records into the registry tables and exits.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use sambahayan_core::person::Person;
use sambahayan_engine::Engine;
use sambahayan_server::{ServerConfig, env_source, semantic::HttpSemanticFilter};
use sambahayan_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Household member suggestion server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Import registry person records from a JSON file and exit.
  #[arg(long, value_name = "FILE")]
  import_persons: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let server_cfg: ServerConfig = sambahayan_server::load_config(&cli.config, env_source())
    .with_context(|| format!("failed to load config from {:?}", cli.config))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  // Helper mode: import persons and exit.
  if let Some(path) = cli.import_persons {
    let raw = tokio::fs::read_to_string(&path)
      .await
      .with_context(|| format!("failed to read {path:?}"))?;
    let persons: Vec<Person> =
      serde_json::from_str(&raw).with_context(|| format!("failed to parse {path:?}"))?;
    let count = store
      .import_persons(persons)
      .await
      .context("failed to import persons")?;
    tracing::info!(count, "imported registry records");
    return Ok(());
  }

  let mut engine = Engine::new(Arc::new(store), server_cfg.engine.clone());
  match &server_cfg.semantic_filter_url {
    Some(url) => {
      let filter = HttpSemanticFilter::new(url.clone(), server_cfg.engine.filter.timeout())?;
      engine = engine.with_filter(Arc::new(filter));
      tracing::info!(%url, "semantic filter enabled");
    }
    None => tracing::info!("no semantic_filter_url; refinement disabled"),
  }

  let app = sambahayan_api::api_router(Arc::new(engine));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
