use std::io;
use std::sync::Arc;
use std::time::Duration;

use am_core::EventBus;
use am_health::HealthMonitor;
use am_layers::{FsWatcher, ProcessMonitor, ShellHookLayer};
use am_logger::LlmLoggerRegistry;
use am_server::{AppState, Cli};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> io::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let am_dir = cli.am_dir_or_default();
    let cancel = CancellationToken::new();
    let bus = EventBus::new();

    let am_initialized = match tokio::fs::create_dir_all(&am_dir).await {
        Ok(()) => true,
        Err(err) => {
            tracing::error!(
                path = %am_dir.display(),
                error = %err,
                "failed to create AM directory at startup; system stays NOT_INITIALIZED"
            );
            false
        }
    };

    let health_monitor = if am_initialized {
        Arc::new(HealthMonitor::with_t_degrade(Duration::from_secs(cli.t_degrade_secs)))
    } else {
        Arc::new(HealthMonitor::not_initialized())
    };
    health_monitor.clone().subscribe_to(&bus);
    health_monitor.clone().spawn_ticker(cancel.clone());

    // The shell-hook heartbeat ticker runs independently of whether the AM
    // directory exists; it alone doesn't touch the filesystem (§4.7).
    ShellHookLayer::new(bus.clone()).spawn(cancel.clone());
    let shell_hook = Arc::new(ShellHookLayer::new(bus.clone()));

    if am_initialized {
        ProcessMonitor::with_scan_interval(bus.clone(), Duration::from_secs(cli.t_scan_secs))
            .spawn(cancel.clone());

        match FsWatcher::new(am_dir.clone(), bus.clone()).spawn(cancel.clone()) {
            Ok(_) => {}
            Err(err) => tracing::error!(error = %err, "failed to start filesystem watcher"),
        }
    } else {
        tracing::warn!("AM directory unavailable: process monitor and filesystem watcher not started");
    }

    let logger_registry = Arc::new(LlmLoggerRegistry::new(
        am_dir.clone(),
        bus.clone(),
        cli.autorespond,
    ));

    let forge_dir = am_dir.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| am_dir.clone());
    let sessions_blob_path = forge_dir.join("sessions.json");
    let sessions_blob = load_sessions_blob(&sessions_blob_path).await;

    let port = cli.port;
    let state = AppState::new(
        cli,
        am_dir,
        am_initialized,
        bus,
        logger_registry,
        health_monitor,
        shell_hook,
        sessions_blob_path,
        sessions_blob,
        cancel,
    );

    tracing::info!(port, "starting am-server");
    am_server::run(state, port).await
}

async fn load_sessions_blob(path: &std::path::Path) -> serde_json::Value {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|_| default_sessions_blob()),
        Err(_) => default_sessions_blob(),
    }
}

fn default_sessions_blob() -> serde_json::Value {
    serde_json::json!({ "tabs": [], "activeTabId": null })
}

fn init_logging(log_level: Option<&str>) {
    let filter = match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}
