//! Mythos server: configuration and the top-level router.
//!
//! The binary in `main.rs` loads a [`ServerConfig`] with [`load_config`],
//! picks a store backend and a token verifier, and serves [`app`].

pub mod remote;

use std::{collections::HashMap, path::Path, path::PathBuf};

use axum::Router;
use config::{ConfigError, Environment, File};
use mythos_api::AppState;
use mythos_core::store::WorldStore;
use serde::Deserialize;
use tower_http::{services::ServeDir, trace::TraceLayer};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Which [`WorldStore`] implementation to run against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
  #[default]
  Sqlite,
  /// Nothing persists across restarts.
  Memory,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `MYTHOS_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:            String,
  pub port:            u16,
  #[serde(default)]
  pub backend:         Backend,
  /// SQLite database file; ignored by the memory backend.
  pub store_path:      PathBuf,
  pub upload_dir:      PathBuf,
  /// Origin uploaded image URLs are built from, e.g. `https://mythos.example`.
  pub public_base_url: String,
  /// Create the sample "Ashfall" project for this user id at startup.
  #[serde(default)]
  pub seed_fixtures:   Option<String>,
  #[serde(default)]
  pub auth:            AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
  /// Static token → user id pairs, for development.
  #[serde(default)]
  pub tokens:         HashMap<String, String>,
  /// Identity provider endpoint that answers a bearer token with the
  /// user's id. Takes precedence over `tokens`.
  #[serde(default)]
  pub userinfo_url:   Option<String>,
  #[serde(default = "default_cache_ttl")]
  pub cache_ttl_secs: u64,
}

fn default_cache_ttl() -> u64 { 300 }

impl Default for AuthSettings {
  fn default() -> Self {
    Self { tokens: HashMap::new(), userinfo_url: None, cache_ttl_secs: default_cache_ttl() }
  }
}

/// `MYTHOS_`-prefixed variables; a double underscore descends into a table,
/// so `MYTHOS_AUTH__USERINFO_URL` sets `auth.userinfo_url`.
pub fn environment() -> Environment {
  Environment::with_prefix("MYTHOS").prefix_separator("_").separator("__")
}

/// Layer defaults, the optional TOML file at `path`, then `env`.
pub fn load_config(path: &Path, env: Environment) -> Result<ServerConfig, ConfigError> {
  config::Config::builder()
    .set_default("host", "127.0.0.1")?
    .set_default("port", 8080)?
    .set_default("store_path", "mythos.db")?
    .set_default("upload_dir", "uploads")?
    .set_default("public_base_url", "http://localhost:8080")?
    .add_source(File::from(path).required(false))
    .add_source(env)
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The JSON API under `/api`, uploaded files under `/uploads`.
pub fn app<S>(state: AppState<S>, upload_dir: &Path) -> Router
where
  S: WorldStore + 'static,
{
  Router::new()
    .nest("/api", mythos_api::api_router(state))
    .nest_service("/uploads", ServeDir::new(upload_dir))
    .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{
    body::Body,
    http::{Request, StatusCode},
  };
  use mythos_api::{auth::StaticTokens, uploads::DiskImageStore};
  use mythos_store_memory::MemoryStore;
  use tower::ServiceExt as _;

  use super::*;

  fn state(upload_dir: &Path) -> AppState<MemoryStore> {
    AppState {
      store:  Arc::new(MemoryStore::new()),
      auth:   Arc::new(StaticTokens::default()),
      images: Arc::new(DiskImageStore::new(upload_dir, "http://localhost:8080")),
    }
  }

  fn env(vars: &[(&str, &str)]) -> Environment {
    let vars = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    environment().source(Some(vars))
  }

  #[test]
  fn config_defaults_fill_optional_sections() {
    let cfg = load_config(Path::new("/nonexistent/mythos.toml"), env(&[])).unwrap();
    assert_eq!(cfg.host, "127.0.0.1");
    assert_eq!(cfg.port, 8080);
    assert_eq!(cfg.backend, Backend::Sqlite);
    assert_eq!(cfg.seed_fixtures, None);
    assert_eq!(cfg.auth.cache_ttl_secs, 300);
    assert!(cfg.auth.tokens.is_empty());
  }

  #[test]
  fn environment_overrides_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "port = 7000\nbackend = \"memory\"\n\n[auth]\ncache_ttl_secs = 60\n")
      .unwrap();

    let cfg = load_config(&path, env(&[])).unwrap();
    assert_eq!(cfg.port, 7000);
    assert_eq!(cfg.backend, Backend::Memory);

    let cfg = load_config(
      &path,
      env(&[
        ("MYTHOS_PORT", "9999"),
        ("MYTHOS_STORE_PATH", "/srv/mythos.db"),
        ("MYTHOS_AUTH__USERINFO_URL", "https://id.example/userinfo"),
        ("OTHER_PORT", "1"),
      ]),
    )
    .unwrap();
    assert_eq!(cfg.port, 9999);
    assert_eq!(cfg.store_path, PathBuf::from("/srv/mythos.db"));
    assert_eq!(cfg.auth.userinfo_url.as_deref(), Some("https://id.example/userinfo"));
    assert_eq!(cfg.auth.cache_ttl_secs, 60);
  }

  #[tokio::test]
  async fn api_is_nested_and_uploads_are_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.png"), b"png bytes").unwrap();
    let app = app(state(dir.path()), dir.path());

    let res = app
      .clone()
      .oneshot(Request::builder().uri("/api/projects").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = app
      .oneshot(Request::builder().uri("/uploads/hello.png").body(Body::empty()).unwrap())
      .await
      .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"png bytes");
  }
}
