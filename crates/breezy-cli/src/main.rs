//! `breezy` — terminal dashboard for the Breezy clinic server.
//!
//! # Usage
//!
//! ```
//! breezy --url http://localhost:8080
//! breezy --config ~/.config/breezy/cli.toml
//! ```

mod app;
mod client;
mod ui;

use std::{
  io::{self, Stdout},
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::{Context, Result};
use app::App;
use clap::Parser;
use client::{ApiClient, ApiConfig};
use crossterm::{
  event::{self, Event, KeyEvent, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use serde::Deserialize;

const DEFAULT_URL: &str = "http://localhost:8080";

#[derive(Parser, Debug)]
#[command(name = "breezy", about = "Terminal dashboard for the Breezy clinic server")]
struct Args {
  /// TOML file with a `url` key.
  #[arg(short, long, value_name = "FILE")]
  config: Option<PathBuf>,

  /// Base URL of the breezy server [default: http://localhost:8080].
  #[arg(long, env = "BREEZY_URL")]
  url: Option<String>,
}

/// Optional `cli.toml`.
#[derive(Deserialize, Default, Debug)]
struct ConfigFile {
  url: Option<String>,
}

impl ConfigFile {
  fn read(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config file {}", path.display()))
  }
}

/// `--url` (or `BREEZY_URL`), then the config file, then [`DEFAULT_URL`].
/// Blank values count as unset.
fn base_url(flag: Option<String>, file: ConfigFile) -> String {
  [flag, file.url]
    .into_iter()
    .flatten()
    .map(|u| u.trim().to_owned())
    .find(|u| !u.is_empty())
    .unwrap_or_else(|| DEFAULT_URL.to_owned())
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let file = match &args.config {
    Some(path) => ConfigFile::read(path)?,
    None => ConfigFile::default(),
  };

  let client = ApiClient::new(ApiConfig { base_url: base_url(args.url, file) })?;
  let mut app = App::new(client);

  // Load before touching the terminal so connection errors print normally.
  app.load_lists().await?;

  let mut screen = RawScreen::enter()?;
  run(&mut screen.terminal, &mut app).await
}

// ─── Terminal ─────────────────────────────────────────────────────────────────

/// Raw mode plus the alternate screen, undone on drop.
struct RawScreen {
  terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl RawScreen {
  fn enter() -> Result<Self> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout)).context("creating terminal")?;
    Ok(Self { terminal })
  }
}

impl Drop for RawScreen {
  fn drop(&mut self) {
    disable_raw_mode().ok();
    execute!(self.terminal.backend_mut(), LeaveAlternateScreen).ok();
    self.terminal.show_cursor().ok();
  }
}

/// Wait up to 50 ms for a key press, off the async workers.
fn next_key_press() -> io::Result<Option<KeyEvent>> {
  tokio::task::block_in_place(|| {
    if !event::poll(Duration::from_millis(50))? {
      return Ok(None);
    }
    Ok(match event::read()? {
      Event::Key(key) if key.kind == KeyEventKind::Press => Some(key),
      _ => None,
    })
  })
}

async fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
  loop {
    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;
    if let Some(key) = next_key_press()?
      && !app.handle_key(key).await?
    {
      return Ok(());
    }
  }
}
