//! HTTP server wiring for Sanctum.
//!
//! Turns a [`ServerConfig`] into session settings and a content catalog, and
//! mounts the JSON API under `/api` with request tracing.

use std::path::{Path, PathBuf};

use axum::{Router, http::HeaderName, routing::get};
use chrono::FixedOffset;
use sanctum_api::{AppState, SessionSettings, api_router, session::DEFAULT_OWNER_HEADER};
use sanctum_core::{Error, content::ContentCatalog, retry::RetryPolicy, store::DocumentStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `sanctum.toml` and
/// `SANCTUM_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:               String,
  pub port:               u16,
  pub store_path:         PathBuf,
  /// Header carrying the authenticated owner id.
  pub owner_header:       String,
  /// Offset from UTC, in minutes, that defines an owner's calendar day.
  pub utc_offset_minutes: i32,
  /// Replaces the built-in content catalog when set.
  pub content_path:       Option<PathBuf>,
  pub retry:              RetryPolicy,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:               "127.0.0.1".to_string(),
      port:               8787,
      store_path:         PathBuf::from("~/.local/share/sanctum/sanctum.db"),
      owner_header:       DEFAULT_OWNER_HEADER.to_string(),
      utc_offset_minutes: 0,
      content_path:       None,
      retry:              RetryPolicy::default(),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  pub fn session_settings(&self) -> Result<SessionSettings, Error> {
    let owner_header = HeaderName::from_bytes(self.owner_header.trim().as_bytes())
      .map_err(|_| Error::Configuration(format!("invalid owner header {:?}", self.owner_header)))?;
    let utc_offset = self
      .utc_offset_minutes
      .checked_mul(60)
      .and_then(FixedOffset::east_opt)
      .ok_or_else(|| {
        Error::Configuration(format!("utc offset {} minutes is out of range", self.utc_offset_minutes))
      })?;
    Ok(SessionSettings { owner_header, utc_offset, retry: self.retry.clone() })
  }

  /// The configured catalog, or the built-in one.
  pub fn load_catalog(&self) -> Result<ContentCatalog, Error> {
    match &self.content_path {
      Some(path) => load_catalog(path),
      None => ContentCatalog::builtin(),
    }
  }
}

pub fn load_catalog(path: &Path) -> Result<ContentCatalog, Error> {
  let source = std::fs::read_to_string(path)
    .map_err(|e| Error::Configuration(format!("failed to read content file {path:?}: {e}")))?;
  ContentCatalog::from_toml(&source)
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API under `/api`, a liveness probe, and
/// request tracing.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: DocumentStore + Clone + 'static,
{
  Router::new()
    .route("/healthz", get(|| async { "ok" }))
    .nest("/api", api_router(state))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
  };
  use sanctum_core::memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, config::FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  // ── configuration ─────────────────────────────────────────────────────────

  #[test]
  fn empty_config_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.port, 8787);
    assert_eq!(cfg.owner_header, DEFAULT_OWNER_HEADER);
    assert_eq!(cfg.retry, RetryPolicy::default());
    assert!(cfg.content_path.is_none());
  }

  #[test]
  fn partial_retry_table_keeps_other_defaults() {
    let cfg = parse("port = 9000\n[retry]\nmax_attempts = 7\n");
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.retry.max_attempts, 7);
    assert_eq!(cfg.retry.initial_backoff_ms, RetryPolicy::default().initial_backoff_ms);
  }

  #[test]
  fn offset_becomes_a_fixed_offset() {
    let cfg = ServerConfig { utc_offset_minutes: -300, ..ServerConfig::default() };
    let settings = cfg.session_settings().unwrap();
    assert_eq!(settings.utc_offset.local_minus_utc(), -300 * 60);
  }

  #[test]
  fn out_of_range_offset_is_a_configuration_error() {
    let cfg = ServerConfig { utc_offset_minutes: 24 * 60, ..ServerConfig::default() };
    assert!(matches!(cfg.session_settings(), Err(Error::Configuration(_))));
  }

  #[test]
  fn invalid_header_is_a_configuration_error() {
    let cfg = ServerConfig { owner_header: "not a header".into(), ..ServerConfig::default() };
    assert!(matches!(cfg.session_settings(), Err(Error::Configuration(_))));
  }

  #[test]
  fn missing_content_file_is_a_configuration_error() {
    let cfg = ServerConfig {
      content_path: Some(PathBuf::from("/nonexistent/sanctum-content.toml")),
      ..ServerConfig::default()
    };
    assert!(matches!(cfg.load_catalog(), Err(Error::Configuration(_))));
  }

  // ── router ────────────────────────────────────────────────────────────────

  fn app(cfg: &ServerConfig) -> Router {
    let state = AppState::new(
      MemoryStore::new(),
      cfg.load_catalog().unwrap(),
      cfg.session_settings().unwrap(),
    );
    router(state)
  }

  #[tokio::test]
  async fn health_needs_no_owner() {
    let resp = app(&ServerConfig::default())
      .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
  }

  #[tokio::test]
  async fn api_is_mounted_and_honours_the_configured_header() {
    let cfg = ServerConfig { owner_header: "x-user".into(), ..ServerConfig::default() };
    let app = app(&cfg);

    let req = Request::get("/api/daily/dashboard/today")
      .header(DEFAULT_OWNER_HEADER, "a")
      .body(Body::empty())
      .unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = Request::get("/api/daily/dashboard/today")
      .header("x-user", "a")
      .body(Body::empty())
      .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value =
      serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body["owner_id"], "a");
  }
}
