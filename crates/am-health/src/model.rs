use std::collections::HashMap;

use am_core::LayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayerStatus {
    Unknown,
    Healthy,
    Degraded,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerHealth {
    pub layer: LayerId,
    pub status: LayerStatus,
    pub last_heartbeat: Option<DateTime<Utc>>,
    pub event_count: u64,
}

impl LayerHealth {
    pub fn new(layer: LayerId) -> Self {
        Self {
            layer,
            status: LayerStatus::Unknown,
            last_heartbeat: None,
            event_count: 0,
        }
    }
}

/// The aggregate rolled up over layers 1-4. `NotInitialized` is a distinct
/// top-level state reachable only at startup (AM directory could not be
/// created); it never transitions back into the normal ladder below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SystemStatus {
    NotInitialized,
    Healthy,
    Warning,
    Degraded,
    Critical,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub conversations_started: u64,
    pub conversations_completed: u64,
    pub active_conversations: u64,
    /// Conversation files that passed content validation, accumulated
    /// across every `validate_all_conversations` run (§4.3, §4.8).
    pub conversations_validated: u64,
    /// Running total of `ValidationReport::valid` across every run (§7).
    pub valid_files: u64,
    /// Running total of `ValidationReport::corrupted` across every run (§7).
    pub validation_errors: u64,
}

impl HealthMetrics {
    pub fn on_llm_start(&mut self) {
        self.conversations_started += 1;
        self.active_conversations += 1;
    }

    pub fn on_llm_end(&mut self) {
        self.conversations_completed += 1;
        self.active_conversations = self.active_conversations.saturating_sub(1);
    }

    /// Folds one validation run into the running totals. A file that
    /// parses and passes the content checks is both a "valid file" and a
    /// validated conversation, since each conversation is stored as
    /// exactly one `llm-conv-*.json` file.
    pub fn on_validation(&mut self, report: &ValidationReport) {
        self.conversations_validated += report.valid as u64;
        self.valid_files += report.valid as u64;
        self.validation_errors += report.corrupted as u64;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub status: SystemStatus,
    pub layers: HashMap<LayerId, LayerHealth>,
    pub metrics: HealthMetrics,
}

impl SystemHealth {
    pub fn not_initialized() -> Self {
        Self {
            status: SystemStatus::NotInitialized,
            layers: HashMap::new(),
            metrics: HealthMetrics::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub total: usize,
    pub valid: usize,
    pub corrupted: usize,
    pub errors: Vec<String>,
}
