use std::collections::HashMap;
use std::time::Duration;

use am_core::{EventBus, EventKind, LayerEvent, LayerId, LAYER_FS_WATCHER, LAYER_HEALTH_MONITOR,
    LAYER_PROCESS_MONITOR, LAYER_PTY, LAYER_SHELL_HOOK};
use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::model::{HealthMetrics, LayerHealth, LayerStatus, SystemHealth, SystemStatus, ValidationReport};

const MONITORED_LAYERS: [LayerId; 4] = [LAYER_PTY, LAYER_SHELL_HOOK, LAYER_PROCESS_MONITOR, LAYER_FS_WATCHER];
const CHECK_INTERVAL: Duration = Duration::from_secs(5);
const DEFAULT_T_DEGRADE: Duration = Duration::from_secs(30);

struct Inner {
    layers: HashMap<LayerId, LayerHealth>,
    metrics: HealthMetrics,
}

impl Inner {
    fn new() -> Self {
        let layers = MONITORED_LAYERS
            .into_iter()
            .map(|id| (id, LayerHealth::new(id)))
            .collect();
        Self {
            layers,
            metrics: HealthMetrics::default(),
        }
    }
}

/// Subscribes to the event bus and tracks per-layer liveness. Computes the
/// aggregate `SystemStatus` on a 5-second tick; layer 5 (itself) is
/// excluded from the aggregate since it cannot observe its own failure.
pub struct HealthMonitor {
    state: RwLock<Inner>,
    t_degrade: Duration,
    not_initialized: bool,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::with_t_degrade(DEFAULT_T_DEGRADE)
    }

    pub fn with_t_degrade(t_degrade: Duration) -> Self {
        Self {
            state: RwLock::new(Inner::new()),
            t_degrade,
            not_initialized: false,
        }
    }

    /// The AM directory could not be created at startup: the whole
    /// `SystemHealth` starts and stays in `NotInitialized` regardless of
    /// any layer heartbeats that may still arrive.
    pub fn not_initialized() -> Self {
        Self {
            state: RwLock::new(Inner::new()),
            t_degrade: DEFAULT_T_DEGRADE,
            not_initialized: true,
        }
    }

    pub async fn on_event(&self, event: &LayerEvent) {
        if self.not_initialized {
            return;
        }

        let mut state = self.state.write().await;

        if let Some(layer) = state.layers.get_mut(&event.layer) {
            layer.last_heartbeat = Some(event.timestamp);
            layer.event_count += 1;
            if layer.status == LayerStatus::Unknown {
                layer.status = LayerStatus::Healthy;
            }
        }

        match event.kind {
            EventKind::LlmStart => state.metrics.on_llm_start(),
            EventKind::LlmEnd => state.metrics.on_llm_end(),
            _ => {}
        }
    }

    /// Folds a `validate_all_conversations` run into the metrics surfaced
    /// by `snapshot` (§4.8: content validation must update metrics). A
    /// no-op while `NotInitialized`, same as `on_event`.
    pub async fn record_validation(&self, report: &ValidationReport) {
        if self.not_initialized {
            return;
        }
        let mut state = self.state.write().await;
        state.metrics.on_validation(report);
    }

    async fn tick(&self) {
        if self.not_initialized {
            return;
        }

        let now = Utc::now();
        let mut state = self.state.write().await;

        for layer in state.layers.values_mut() {
            let Some(last_heartbeat) = layer.last_heartbeat else {
                continue; // stays UNKNOWN until first heartbeat
            };

            let age = now.signed_duration_since(last_heartbeat);
            let age = age.to_std().unwrap_or(Duration::ZERO);

            if age > self.t_degrade * 2 && layer.status == LayerStatus::Degraded {
                layer.status = LayerStatus::Failed;
            } else if age > self.t_degrade && layer.status == LayerStatus::Healthy {
                layer.status = LayerStatus::Degraded;
            }
        }
    }

    pub async fn snapshot(&self) -> SystemHealth {
        if self.not_initialized {
            return SystemHealth::not_initialized();
        }

        let state = self.state.read().await;
        let healthy_count = state
            .layers
            .values()
            .filter(|l| l.status == LayerStatus::Healthy)
            .count();
        let total = state.layers.len();

        let status = if healthy_count == 0 {
            SystemStatus::Critical
        } else if healthy_count == 1 {
            SystemStatus::Degraded
        } else if healthy_count < total {
            SystemStatus::Warning
        } else {
            SystemStatus::Healthy
        };

        SystemHealth {
            status,
            layers: state.layers.clone(),
            metrics: state.metrics.clone(),
        }
    }

    pub fn spawn_ticker(self: std::sync::Arc<Self>, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(CHECK_INTERVAL);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("health monitor shutting down");
                        return;
                    }
                    _ = ticker.tick() => {
                        self.tick().await;
                    }
                }
            }
        })
    }

    pub fn subscribe_to(self: std::sync::Arc<Self>, bus: &EventBus) {
        let monitor = self.clone();
        bus.subscribe_with_handler("health-monitor", move |event| {
            let monitor = monitor.clone();
            tokio::spawn(async move {
                monitor.on_event(&event).await;
            });
        });
        let _ = LAYER_HEALTH_MONITOR;
    }
}

impl Default for HealthMonitor {
    fn default() -> Self {
        Self::new()
    }
}
