use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::{Error, Result};
use crate::model::EntryType;

/// Per-tab append-only markdown log. `enabled` only gates whether the UI
/// shows the log; capture continues regardless, since the log exists for
/// on-disk crash recovery.
pub struct SessionLogger {
    path: PathBuf,
    tab_id: String,
    workspace: String,
    enabled: AtomicBool,
    write_lock: Mutex<()>,
}

impl SessionLogger {
    pub async fn create(
        am_dir: &std::path::Path,
        tab_id: impl Into<String>,
        tab_name: &str,
        workspace: impl Into<String>,
        enabled: bool,
    ) -> Result<Self> {
        let tab_id = tab_id.into();
        let workspace = workspace.into();
        let started = Utc::now();

        let sanitized_workspace = sanitize_component(&workspace);
        let file_name = format!(
            "{}_{}_session.md",
            started.format("%Y-%m-%d_%H-%M"),
            sanitized_workspace
        );
        let path = am_dir.join(file_name);

        fs::create_dir_all(am_dir).await.map_err(|source| Error::Io {
            path: am_dir.display().to_string(),
            source,
        })?;

        let header = format!(
            "| Key | Value |\n|---|---|\n\
             | tab_id | {tab_id} |\n\
             | tab_name | {tab_name} |\n\
             | workspace | {workspace} |\n\
             | session_started | {started} |\n\n"
        );

        fs::write(&path, header).await.map_err(|source| Error::Io {
            path: path.display().to_string(),
            source,
        })?;

        let logger = Self {
            path,
            tab_id,
            workspace,
            enabled: AtomicBool::new(enabled),
            write_lock: Mutex::new(()),
        };

        logger.append(EntryType::SessionStarted, "").await?;
        Ok(logger)
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    pub fn tab_id(&self) -> &str {
        &self.tab_id
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Relaxed)
    }

    pub async fn append(&self, entry_type: EntryType, content: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let timestamp = Utc::now().to_rfc3339();
        let section = if content.is_empty() {
            format!("## {timestamp} [{}]\n\n", entry_type.marker())
        } else {
            format!("## {timestamp} [{}]\n\n{content}\n\n", entry_type.marker())
        };

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        file.write_all(section.as_bytes())
            .await
            .map_err(|source| Error::Io {
                path: self.path.display().to_string(),
                source,
            })?;

        Ok(())
    }

    /// Side-channel marker recorded whenever C4 observes a conversation
    /// start for this tab; counted verbatim by the recovery scan.
    pub async fn record_llm_start(&self) -> Result<()> {
        self.append_marker("LLM_START").await
    }

    async fn append_marker(&self, marker: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let timestamp = Utc::now().to_rfc3339();
        let line = format!("## {timestamp} [{marker}]\n\n");

        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| Error::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|source| Error::Io {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(())
    }

    pub async fn end(&self, interrupted: bool) -> Result<()> {
        let entry_type = if interrupted {
            EntryType::Interrupted
        } else {
            EntryType::SessionEnded
        };
        self.append(entry_type, "").await
    }
}

fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn create_writes_metadata_header_and_session_started() {
        let dir = tempdir().unwrap();
        let logger = SessionLogger::create(dir.path(), "tab1", "Terminal 1", "/home/user/project", true)
            .await
            .unwrap();

        let contents = fs::read_to_string(logger.path()).await.unwrap();
        assert!(contents.contains("| tab_id | tab1 |"));
        assert!(contents.contains("[SESSION_STARTED]"));
    }

    #[tokio::test]
    async fn append_adds_a_dated_section() {
        let dir = tempdir().unwrap();
        let logger = SessionLogger::create(dir.path(), "tab1", "Terminal 1", "ws", true)
            .await
            .unwrap();

        logger.append(EntryType::UserInput, "ls -la").await.unwrap();

        let contents = fs::read_to_string(logger.path()).await.unwrap();
        assert!(contents.contains("[USER_INPUT]"));
        assert!(contents.contains("ls -la"));
    }

    #[tokio::test]
    async fn disabled_logger_still_captures() {
        let dir = tempdir().unwrap();
        let logger = SessionLogger::create(dir.path(), "tab1", "Terminal 1", "ws", false)
            .await
            .unwrap();
        assert!(!logger.is_enabled());

        logger.append(EntryType::UserInput, "hidden but captured").await.unwrap();
        let contents = fs::read_to_string(logger.path()).await.unwrap();
        assert!(contents.contains("hidden but captured"));
    }

    #[tokio::test]
    async fn end_without_interrupted_writes_session_ended_marker() {
        let dir = tempdir().unwrap();
        let logger = SessionLogger::create(dir.path(), "tab1", "Terminal 1", "ws", true)
            .await
            .unwrap();
        logger.end(false).await.unwrap();
        let contents = fs::read_to_string(logger.path()).await.unwrap();
        assert!(contents.contains("[SESSION_ENDED]"));
    }

    #[tokio::test]
    async fn record_llm_start_is_counted_textually() {
        let dir = tempdir().unwrap();
        let logger = SessionLogger::create(dir.path(), "tab1", "Terminal 1", "ws", true)
            .await
            .unwrap();
        logger.record_llm_start().await.unwrap();
        logger.record_llm_start().await.unwrap();
        let contents = fs::read_to_string(logger.path()).await.unwrap();
        assert_eq!(contents.matches("[LLM_START]").count(), 2);
    }
}
