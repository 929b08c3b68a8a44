use std::collections::HashMap;
use std::time::{Duration, Instant};

use am_core::{classify, EventBus, EventKind, LayerEvent, LAYER_PROCESS_MONITOR};
use sysinfo::{Pid, ProcessRefreshKind, RefreshKind, System, UpdateKind};
use tokio_util::sync::CancellationToken;

const PROVIDERS: [&str; 3] = ["copilot", "claude", "aider"];

struct TrackedProcess {
    conversation_id: String,
    provider: String,
    cmdline: String,
    last_seen: Instant,
}

/// Every scan tick, enumerate OS processes whose command line mentions a
/// known provider. LLM_START/LLM_END from this layer are corroborating
/// evidence only — C4 (tab-keyed) owns conversation identity.
pub struct ProcessMonitor {
    bus: EventBus,
    scan_interval: Duration,
}

impl ProcessMonitor {
    pub fn new(bus: EventBus) -> Self {
        Self::with_scan_interval(bus, Duration::from_secs(2))
    }

    pub fn with_scan_interval(bus: EventBus, scan_interval: Duration) -> Self {
        Self { bus, scan_interval }
    }

    pub fn spawn(self, cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn run(self, cancel: CancellationToken) {
        let refresh_kind = RefreshKind::nothing().with_processes(
            ProcessRefreshKind::nothing()
                .with_cmd(UpdateKind::Always)
                .with_exe(UpdateKind::Always),
        );
        let mut system = System::new_with_specifics(refresh_kind);
        let mut tracked: HashMap<Pid, TrackedProcess> = HashMap::new();
        let mut ticker = tokio::time::interval(self.scan_interval);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("process monitor shutting down");
                    return;
                }
                _ = ticker.tick() => {
                    system.refresh_specifics(refresh_kind);
                    self.scan_once(&system, &mut tracked);
                }
            }
        }
    }

    fn scan_once(&self, system: &System, tracked: &mut HashMap<Pid, TrackedProcess>) {
        let mut seen = Vec::new();

        for (pid, process) in system.processes() {
            let cmdline = process
                .cmd()
                .iter()
                .map(|s| s.to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(" ");

            if !mentions_known_provider(&cmdline) {
                continue;
            }

            seen.push(*pid);

            if let Some(existing) = tracked.get_mut(pid) {
                existing.last_seen = Instant::now();
                continue;
            }

            let Some(detected) = classify_cmdline(&cmdline) else {
                continue;
            };

            let conversation_id = format!("proc-{}-{}", pid, uuid::Uuid::new_v4());
            tracked.insert(
                *pid,
                TrackedProcess {
                    conversation_id: conversation_id.clone(),
                    provider: detected.clone(),
                    cmdline: cmdline.clone(),
                    last_seen: Instant::now(),
                },
            );

            self.bus.publish(
                LayerEvent::new(EventKind::LlmStart, LAYER_PROCESS_MONITOR)
                    .with_conversation_id(conversation_id)
                    .with_provider(detected)
                    .with_meta("pid", pid.to_string())
                    .with_meta("cmdline", cmdline),
            );
        }

        let ended: Vec<Pid> = tracked
            .keys()
            .filter(|pid| !seen.contains(pid))
            .copied()
            .collect();

        for pid in ended {
            if let Some(proc) = tracked.remove(&pid) {
                self.bus.publish(
                    LayerEvent::new(EventKind::LlmEnd, LAYER_PROCESS_MONITOR)
                        .with_conversation_id(proc.conversation_id)
                        .with_provider(proc.provider)
                        .with_meta("pid", pid.to_string())
                        .with_meta("cmdline", proc.cmdline),
                );
            }
        }

        self.bus
            .publish(LayerEvent::new(EventKind::Heartbeat, LAYER_PROCESS_MONITOR));
    }
}

fn mentions_known_provider(cmdline: &str) -> bool {
    let lower = cmdline.to_lowercase();
    PROVIDERS.iter().any(|p| lower.contains(p))
}

/// Classify a full command line (not a shell input line) into a provider
/// name, reusing C2's classifier on whichever known token appears first.
fn classify_cmdline(cmdline: &str) -> Option<String> {
    let lower = cmdline.to_lowercase();
    for token in PROVIDERS {
        if lower.contains(token) {
            let provider = if token == "copilot" { "github-copilot" } else { token };
            let detected = classify(token);
            return Some(if detected.detected { detected.provider } else { provider.to_string() });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_known_provider_matches_case_insensitively() {
        assert!(mentions_known_provider("/usr/bin/Claude --resume"));
        assert!(mentions_known_provider("gh copilot suggest 'ls'"));
        assert!(mentions_known_provider("aider --model gpt"));
        assert!(!mentions_known_provider("/usr/bin/bash"));
    }

    #[test]
    fn classify_cmdline_picks_known_provider() {
        assert_eq!(classify_cmdline("node /usr/lib/claude-cli/index.js"), Some("claude".to_string()));
        assert_eq!(classify_cmdline("/usr/bin/aider main.py"), Some("aider".to_string()));
        assert_eq!(classify_cmdline("/usr/bin/bash"), None);
    }

    #[test]
    fn scan_once_tracks_then_ends_on_disappearance() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        let monitor = ProcessMonitor::new(bus.clone());

        let mut tracked = HashMap::new();
        tracked.insert(
            Pid::from(1234),
            TrackedProcess {
                conversation_id: "proc-1234-x".into(),
                provider: "claude".into(),
                cmdline: "claude".into(),
                last_seen: Instant::now(),
            },
        );

        // Empty live-process view: everything tracked should be considered ended.
        let system = System::new();
        monitor.scan_once(&system, &mut tracked);
        assert!(tracked.is_empty());

        let mut saw_end = false;
        let mut saw_heartbeat = false;
        while let Ok(event) = rx.try_recv() {
            match event.kind {
                EventKind::LlmEnd => saw_end = true,
                EventKind::Heartbeat => saw_heartbeat = true,
                _ => {}
            }
        }
        assert!(saw_end);
        assert!(saw_heartbeat);
    }
}
