//! Process-wide `tracing` setup for programs embedding the clients.
//!
//! Library code only emits events. Installing a subscriber is left to the
//! application, which calls [`init`] once (or several times; only the first
//! call has any effect).

use std::sync::OnceLock;

use serde::Deserialize;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogConfig {
  /// Default filter directive; `RUST_LOG` still wins when set.
  #[serde(default = "default_level")]
  pub level: String,
  #[serde(default)]
  pub ansi:  bool,
}

fn default_level() -> String { "info".to_owned() }

impl Default for LogConfig {
  fn default() -> Self { Self { level: default_level(), ansi: false } }
}

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Install a stderr fmt subscriber. Returns `true` only for the call that
/// actually installed it.
pub fn init(config: &LogConfig) -> bool {
  let mut installed_now = false;
  INSTALLED.get_or_init(|| {
    let default = config.level.parse::<LevelFilter>().unwrap_or(LevelFilter::INFO);
    let filter = EnvFilter::builder()
      .with_default_directive(default.into())
      .from_env_lossy();
    installed_now = tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_ansi(config.ansi)
      .with_writer(std::io::stderr)
      .try_init()
      .is_ok();
    installed_now
  });
  installed_now
}
