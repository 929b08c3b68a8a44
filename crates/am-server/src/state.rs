use std::path::PathBuf;
use std::sync::Arc;

use am_core::EventBus;
use am_health::HealthMonitor;
use am_layers::ShellHookLayer;
use am_logger::LlmLoggerRegistry;
use am_session::SessionLogger;
use dashmap::DashMap;
use pty_bridge::{PtySession, Shell};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::config::Cli;

/// Single owning container for everything a handler might need, handed out
/// as `web::Data<AppState>`. Replaces the source's module-level globals
/// (`llmLoggers`, the session-log registry) with one struct whose lifecycle
/// is bound to the process (§9).
#[derive(Clone)]
pub struct AppState {
    pub config: Cli,
    pub am_dir: PathBuf,
    pub am_initialized: bool,
    pub bus: EventBus,
    pub logger_registry: Arc<LlmLoggerRegistry>,
    pub health_monitor: Arc<HealthMonitor>,
    pub shell_hook: Arc<ShellHookLayer>,
    /// One `SessionLogger` per tab, created on first `/api/am/log` or
    /// `/api/am/enable` call for that tab.
    pub session_loggers: Arc<DashMap<String, Arc<SessionLogger>>>,
    /// Serializes `SessionLogger` creation so two concurrent first-touch
    /// requests for the same tab can't race into two log files.
    pub session_logger_creation_lock: Arc<Mutex<()>>,
    /// One live PTY per tab, enforcing "at-most-one live shell per tab"
    /// (§3) across reconnects: a second WebSocket upgrade for a known tab
    /// id resubscribes to the existing session instead of respawning.
    pub pty_sessions: Arc<DashMap<String, Arc<PtySession>>>,
    pub pty_shells: Arc<DashMap<String, Shell>>,
    /// Last directory the bridge detected for each tab, replayed as a `cd`
    /// on reconnect (§4.10).
    pub tab_cwd: Arc<DashMap<String, String>>,
    /// Opaque tab/session blob behind `GET`/`POST /api/sessions`; not part
    /// of the core's semantics (§1's scope note), kept as a single JSON
    /// value guarded by a mutex and persisted to `<forge_dir>/sessions.json`.
    pub sessions_blob_path: PathBuf,
    pub sessions_blob: Arc<Mutex<serde_json::Value>>,
    pub cancel: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Cli,
        am_dir: PathBuf,
        am_initialized: bool,
        bus: EventBus,
        logger_registry: Arc<LlmLoggerRegistry>,
        health_monitor: Arc<HealthMonitor>,
        shell_hook: Arc<ShellHookLayer>,
        sessions_blob_path: PathBuf,
        sessions_blob: serde_json::Value,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            am_dir,
            am_initialized,
            bus,
            logger_registry,
            health_monitor,
            shell_hook,
            session_loggers: Arc::new(DashMap::new()),
            session_logger_creation_lock: Arc::new(Mutex::new(())),
            pty_sessions: Arc::new(DashMap::new()),
            pty_shells: Arc::new(DashMap::new()),
            tab_cwd: Arc::new(DashMap::new()),
            sessions_blob_path,
            sessions_blob: Arc::new(Mutex::new(sessions_blob)),
            cancel,
        }
    }
}
