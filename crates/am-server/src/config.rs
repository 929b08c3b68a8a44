use std::path::PathBuf;

use clap::Parser;

/// CLI surface for the am-server binary. Every flag is also an env var,
/// matching `agent-server`'s `Cli` (`--port`/`PORT`, `--log-level`/`RUST_LOG`).
#[derive(Parser, Debug, Clone)]
#[command(name = "am-server")]
#[command(about = "PTY bridge and Artificial Memory recovery server")]
#[command(version)]
pub struct Cli {
    /// Port the HTTP/WebSocket server binds to.
    #[arg(long, env = "AM_PORT", default_value_t = 4000)]
    pub port: u16,

    /// Root directory for conversation JSON, session logs, and their
    /// archive. Defaults to `<cwd>/.forge/am`.
    #[arg(long, env = "AM_DIR")]
    pub am_dir: Option<PathBuf>,

    /// Seconds of silence before a layer degrades (`T_degrade`, default 30).
    #[arg(long, env = "AM_T_DEGRADE_SECS", default_value_t = 30)]
    pub t_degrade_secs: u64,

    /// Seconds between process-monitor scans (`T_scan`, default 2).
    #[arg(long, env = "AM_T_SCAN_SECS", default_value_t = 2)]
    pub t_scan_secs: u64,

    /// Default autorespond setting for newly established terminal bridges;
    /// overridable per connection via the `autorespond` query parameter.
    #[arg(long, env = "AM_AUTORESPOND", default_value_t = false)]
    pub autorespond: bool,

    /// Overrides the `tracing_subscriber::EnvFilter`; falls back to
    /// `RUST_LOG`, then `info`.
    #[arg(long, env = "RUST_LOG")]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn am_dir_or_default(&self) -> PathBuf {
        self.am_dir.clone().unwrap_or_else(default_am_dir)
    }
}

fn default_am_dir() -> PathBuf {
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".forge")
        .join("am")
}
