//! breezy-server binary.
//!
//! Reads `breezy.toml` (or the path specified with `--config`) plus
//! `BREEZY_*` environment overrides, opens the SQLite store, and serves the
//! dashboard API over HTTP.
//!
//! # Seeding
//!
//! To load intake data from a JSON snapshot before serving:
//!
//! ```
//! cargo run -p breezy-server -- --seed fixture.json
//! ```

use std::{path::PathBuf, sync::Arc};

use anyhow::Context as _;
use breezy_api::AppState;
use breezy_server::{ServerConfig, expand_tilde};
use breezy_sms::TwilioTransport;
use breezy_store_sqlite::{Fixture, SqliteStore};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Breezy clinic dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "breezy.toml")]
  config: PathBuf,

  /// Import a JSON fixture (patients, appointments, reports) before serving.
  #[arg(long)]
  seed: Option<PathBuf>,
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
  let server_cfg = ServerConfig::load(&cli.config).context("failed to load configuration")?;
  let status = server_cfg
    .status_policy()
    .context("invalid [status] configuration")?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?
    .with_status_policy(status)
    .await
    .context("failed to apply clinic timezone to the store")?;
  tracing::info!(path = ?store_path, "store opened");

  if let Some(seed) = &cli.seed {
    let fixture = Fixture::from_path(seed)
      .with_context(|| format!("failed to read fixture {seed:?}"))?;
    store.import(&fixture).await.context("failed to import fixture")?;
  }

  // Build the transport and application state.
  let transport = TwilioTransport::new(server_cfg.sms_config())
    .context("invalid [sms] configuration")?;
  if let Some(to) = &server_cfg.sms.test_recipient {
    tracing::warn!(to = %to, "test recipient set; follow-ups will not reach patients");
  }

  let state = AppState::new(
    Arc::new(store),
    Arc::new(transport),
    status,
    server_cfg.send_policy(),
  );

  let app = breezy_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}
