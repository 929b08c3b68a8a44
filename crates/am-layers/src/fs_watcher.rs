use std::path::{Path, PathBuf};
use std::time::Duration;

use am_core::{EventBus, EventKind, LayerEvent, LAYER_FS_WATCHER};
use notify::{Event, EventKind as NotifyEventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);
const CONV_PREFIX: &str = "llm-conv-";

/// Watches the AM directory and republishes any `llm-conv-*` filesystem
/// event onto the shared bus. A 15s idle ticker keeps the layer observably
/// alive even with zero filesystem activity.
pub struct FsWatcher {
    am_dir: PathBuf,
    bus: EventBus,
}

impl FsWatcher {
    pub fn new(am_dir: PathBuf, bus: EventBus) -> Self {
        Self { am_dir, bus }
    }

    pub fn spawn(self, cancel: CancellationToken) -> Result<tokio::task::JoinHandle<()>> {
        let (tx, mut rx) = mpsc::channel::<Event>(256);

        let mut watcher = RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.blocking_send(event);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "filesystem watcher error");
                }
            },
            notify::Config::default(),
        )?;

        watcher
            .watch(&self.am_dir, RecursiveMode::NonRecursive)
            .map_err(Error::Watch)?;

        let bus = self.bus.clone();
        let am_dir = self.am_dir.clone();

        let handle = tokio::spawn(async move {
            // Keep the watcher alive for the lifetime of this task.
            let _watcher = watcher;
            let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("filesystem watcher shutting down");
                        return;
                    }
                    _ = heartbeat.tick() => {
                        bus.publish(LayerEvent::new(EventKind::Heartbeat, LAYER_FS_WATCHER));
                    }
                    event = rx.recv() => {
                        match event {
                            Some(event) => publish_for_event(&bus, &am_dir, &event),
                            None => {
                                tracing::error!("filesystem watcher channel closed unexpectedly");
                                return;
                            }
                        }
                    }
                }
            }
        });

        Ok(handle)
    }
}

fn publish_for_event(bus: &EventBus, am_dir: &Path, event: &Event) {
    for path in &event.paths {
        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !basename.starts_with(CONV_PREFIX) {
            continue;
        }

        let kind = match event.kind {
            NotifyEventKind::Create(_) => EventKind::FsCreate,
            NotifyEventKind::Remove(_) => EventKind::FsRemove,
            _ => EventKind::FsWrite,
        };

        let relative = path
            .strip_prefix(am_dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();

        bus.publish(
            LayerEvent::new(kind, LAYER_FS_WATCHER).with_meta("path", relative),
        );
        bus.publish(LayerEvent::new(EventKind::Heartbeat, LAYER_FS_WATCHER));
    }
}
