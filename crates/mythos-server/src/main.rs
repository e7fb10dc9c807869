//! mythos-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered with
//! `MYTHOS_*` environment variables, opens the configured store, and serves
//! the JSON API under `/api` and uploaded images under `/uploads`.
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `MYTHOS_AUTH__USERINFO_URL`.

use std::{
  path::{Path, PathBuf},
  sync::Arc,
  time::Duration,
};

use anyhow::Context as _;
use clap::Parser;
use mythos_api::{
  AppState,
  auth::{StaticTokens, TokenVerifier},
  uploads::DiskImageStore,
};
use mythos_core::store::WorldStore;
use mythos_server::{AuthSettings, Backend, ServerConfig, remote::RemoteVerifier};
use mythos_store_memory::{MemoryStore, fixtures};
use mythos_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Mythos worldbuilding server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
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
  let mut server_cfg: ServerConfig =
    mythos_server::load_config(&cli.config, mythos_server::environment())
      .with_context(|| format!("failed to load config from {:?}", cli.config))?;
  server_cfg.store_path = expand_tilde(&server_cfg.store_path);
  server_cfg.upload_dir = expand_tilde(&server_cfg.upload_dir);

  let verifier = verifier(&server_cfg.auth)?;

  match server_cfg.backend {
    Backend::Sqlite => {
      let store = SqliteStore::open(&server_cfg.store_path)
        .await
        .with_context(|| format!("failed to open store at {:?}", server_cfg.store_path))?;
      serve(store, verifier, &server_cfg).await
    }
    Backend::Memory => {
      tracing::warn!("using the in-memory store; nothing will persist");
      serve(MemoryStore::new(), verifier, &server_cfg).await
    }
  }
}

/// Pick the token verifier: the identity provider when one is configured,
/// otherwise the static token table.
fn verifier(auth: &AuthSettings) -> anyhow::Result<Arc<dyn TokenVerifier>> {
  if let Some(url) = &auth.userinfo_url {
    tracing::info!(%url, "verifying tokens against identity provider");
    let remote = RemoteVerifier::new(url.clone(), Duration::from_secs(auth.cache_ttl_secs))
      .context("failed to build HTTP client")?;
    return Ok(Arc::new(remote));
  }
  if auth.tokens.is_empty() {
    anyhow::bail!("no authentication configured: set auth.userinfo_url or auth.tokens");
  }
  tracing::warn!(count = auth.tokens.len(), "using static bearer tokens");
  Ok(Arc::new(StaticTokens::new(auth.tokens.clone())))
}

async fn serve<S>(
  store: S,
  verifier: Arc<dyn TokenVerifier>,
  cfg: &ServerConfig,
) -> anyhow::Result<()>
where
  S: WorldStore + 'static,
{
  if let Some(owner) = &cfg.seed_fixtures {
    fixtures::seed(&store, owner)
      .await
      .context("failed to seed sample project")?;
  }

  tokio::fs::create_dir_all(&cfg.upload_dir)
    .await
    .with_context(|| format!("failed to create upload dir {:?}", cfg.upload_dir))?;

  let state = AppState {
    store:  Arc::new(store),
    auth:   verifier,
    images: Arc::new(DiskImageStore::new(&cfg.upload_dir, cfg.public_base_url.clone())),
  };

  let app = mythos_server::app(state, &cfg.upload_dir);
  let address = format!("{}:{}", cfg.host, cfg.port);

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
