use std::path::PathBuf;
use std::sync::Arc;

use am_core::EventBus;
use dashmap::DashMap;

use crate::logger::LlmLogger;

/// Owns every tab's `LlmLogger`. Replaces the mutable-global-registry
/// pattern: there is exactly one of these per server process, handed out
/// via `actix_web::web::Data`, and it never reaches for a static.
pub struct LlmLoggerRegistry {
    loggers: DashMap<String, Arc<LlmLogger>>,
    am_dir: PathBuf,
    bus: EventBus,
    autorespond: bool,
}

impl LlmLoggerRegistry {
    pub fn new(am_dir: PathBuf, bus: EventBus, autorespond: bool) -> Self {
        Self {
            loggers: DashMap::new(),
            am_dir,
            bus,
            autorespond,
        }
    }

    pub fn get_or_create(&self, tab_id: &str) -> Arc<LlmLogger> {
        if let Some(existing) = self.loggers.get(tab_id) {
            return existing.clone();
        }
        self.loggers
            .entry(tab_id.to_string())
            .or_insert_with(|| {
                Arc::new(LlmLogger::new(
                    tab_id,
                    self.am_dir.clone(),
                    self.bus.clone(),
                    self.autorespond,
                ))
            })
            .clone()
    }

    pub fn get(&self, tab_id: &str) -> Option<Arc<LlmLogger>> {
        self.loggers.get(tab_id).map(|entry| entry.clone())
    }

    /// Called when a tab closes. The logger's in-memory conversations are
    /// dropped; anything already flushed to disk survives.
    pub fn remove(&self, tab_id: &str) -> Option<Arc<LlmLogger>> {
        self.loggers.remove(tab_id).map(|(_, logger)| logger)
    }

    pub fn tab_ids(&self) -> Vec<String> {
        self.loggers.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.loggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loggers.is_empty()
    }
}
