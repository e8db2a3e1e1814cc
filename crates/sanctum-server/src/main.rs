//! sanctum server binary.
//!
//! Reads `sanctum.toml` (or the path specified with `--config`) layered with
//! `SANCTUM_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! Nested keys use a double underscore in the environment, for example
//! `SANCTUM_RETRY__MAX_ATTEMPTS=5`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use sanctum_api::AppState;
use sanctum_server::ServerConfig;
use sanctum_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Sanctum server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, env = "SANCTUM_CONFIG", default_value = "sanctum.toml")]
  config: PathBuf,
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
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(
      config::Environment::with_prefix("SANCTUM")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let session = server_cfg.session_settings().context("invalid session settings")?;
  let catalog = server_cfg.load_catalog().context("failed to load content catalog")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = sanctum_server::router(AppState::new(store, catalog, session));
  let address = server_cfg.address();

  tracing::info!(
    store = ?store_path,
    owner_header = %server_cfg.owner_header,
    utc_offset_minutes = server_cfg.utc_offset_minutes,
    "Listening on http://{address}"
  );
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
