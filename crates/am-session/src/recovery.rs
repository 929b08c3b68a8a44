use std::collections::HashMap;
use std::path::Path;

use tokio::fs;

use crate::id::stable_session_id;
use crate::model::{GroupedSessionInfo, SessionInfo};

const SESSION_ENDED_MARKER: &str = "[SESSION_ENDED]";
const LLM_START_MARKER: &str = "[LLM_START]";
const COMMAND_EXECUTED_MARKER: &str = "[COMMAND_EXECUTED]";

/// Scan the AM directory for session log files that never reached a
/// `[SESSION_ENDED]` marker and return one `SessionInfo` per candidate.
pub async fn scan_recoverable(am_dir: &Path) -> Vec<SessionInfo> {
    let mut sessions = Vec::new();

    let Ok(mut entries) = fs::read_dir(am_dir).await else {
        return sessions;
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with("_session.md") {
            continue;
        }

        let Ok(contents) = fs::read_to_string(&path).await else {
            continue;
        };
        if contents.contains(SESSION_ENDED_MARKER) {
            continue;
        }

        if let Some(info) = parse_session_info(&path, &contents) {
            sessions.push(info);
        }
    }

    sessions
}

fn parse_session_info(path: &Path, contents: &str) -> Option<SessionInfo> {
    let tab_id = table_value(contents, "tab_id")?;
    let workspace = table_value(contents, "workspace")?;

    let last_command = contents
        .lines()
        .collect::<Vec<_>>()
        .windows(3)
        .rev()
        .find(|window| window[0].contains(COMMAND_EXECUTED_MARKER))
        .map(|window| window[2].trim().to_string())
        .filter(|s| !s.is_empty());

    let llm_start_count = contents.matches(LLM_START_MARKER).count();

    Some(SessionInfo {
        session_id: stable_session_id(&tab_id, &workspace),
        tab_id,
        workspace,
        log_path: path.display().to_string(),
        last_command,
        llm_start_count,
    })
}

fn table_value(contents: &str, key: &str) -> Option<String> {
    let prefix = format!("| {key} |");
    for line in contents.lines() {
        if let Some(rest) = line.strip_prefix(&prefix) {
            let value = rest.trim().trim_start_matches('|').trim();
            let value = value.trim_end_matches('|').trim();
            return Some(value.to_string());
        }
    }
    None
}

/// Bucket recoverable sessions by workspace, keeping the latest one per
/// bucket (by log file name, which sorts lexicographically by timestamp).
pub fn group_by_workspace(sessions: Vec<SessionInfo>) -> Vec<GroupedSessionInfo> {
    let mut buckets: HashMap<String, Vec<SessionInfo>> = HashMap::new();
    for session in sessions {
        buckets.entry(session.workspace.clone()).or_default().push(session);
    }

    let mut groups: Vec<GroupedSessionInfo> = buckets
        .into_iter()
        .filter_map(|(workspace, mut sessions_in_workspace)| {
            sessions_in_workspace.sort_by(|a, b| a.log_path.cmp(&b.log_path));
            let latest = sessions_in_workspace.pop()?;
            Some(GroupedSessionInfo {
                workspace,
                total_in_workspace: sessions_in_workspace.len() + 1,
                latest,
            })
        })
        .collect();

    groups.sort_by(|a, b| a.workspace.cmp(&b.workspace));
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_log(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).await.unwrap();
    }

    #[tokio::test]
    async fn session_without_ended_marker_is_recoverable() {
        let dir = tempdir().unwrap();
        write_log(
            dir.path(),
            "2026-07-30_09-00_proj_session.md",
            "| Key | Value |\n|---|---|\n| tab_id | tab1 |\n| workspace | /home/u/proj |\n\n## t [SESSION_STARTED]\n\n",
        )
        .await;

        let sessions = scan_recoverable(dir.path()).await;
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].tab_id, "tab1");
        assert_eq!(sessions[0].workspace, "/home/u/proj");
    }

    #[tokio::test]
    async fn session_with_ended_marker_is_not_recoverable() {
        let dir = tempdir().unwrap();
        write_log(
            dir.path(),
            "2026-07-30_09-00_proj_session.md",
            "| Key | Value |\n|---|---|\n| tab_id | tab1 |\n| workspace | /home/u/proj |\n\n## t [SESSION_ENDED]\n\n",
        )
        .await;

        let sessions = scan_recoverable(dir.path()).await;
        assert!(sessions.is_empty());
    }

    #[tokio::test]
    async fn extracts_last_command_executed_entry() {
        let dir = tempdir().unwrap();
        write_log(
            dir.path(),
            "2026-07-30_09-00_proj_session.md",
            "| Key | Value |\n|---|---|\n| tab_id | tab1 |\n| workspace | ws |\n\n\
             ## t1 [COMMAND_EXECUTED]\n\nls -la\n\n\
             ## t2 [COMMAND_EXECUTED]\n\ngit status\n\n",
        )
        .await;

        let sessions = scan_recoverable(dir.path()).await;
        assert_eq!(sessions[0].last_command.as_deref(), Some("git status"));
    }

    #[tokio::test]
    async fn counts_llm_start_markers() {
        let dir = tempdir().unwrap();
        write_log(
            dir.path(),
            "2026-07-30_09-00_proj_session.md",
            "| Key | Value |\n|---|---|\n| tab_id | tab1 |\n| workspace | ws |\n\n\
             ## t1 [LLM_START]\n\n## t2 [LLM_START]\n\n",
        )
        .await;

        let sessions = scan_recoverable(dir.path()).await;
        assert_eq!(sessions[0].llm_start_count, 2);
    }

    #[test]
    fn group_by_workspace_keeps_latest_and_total() {
        let sessions = vec![
            SessionInfo {
                session_id: "a".into(),
                tab_id: "t1".into(),
                workspace: "ws1".into(),
                log_path: "2026-07-29_session.md".into(),
                last_command: None,
                llm_start_count: 0,
            },
            SessionInfo {
                session_id: "b".into(),
                tab_id: "t2".into(),
                workspace: "ws1".into(),
                log_path: "2026-07-30_session.md".into(),
                last_command: None,
                llm_start_count: 0,
            },
        ];

        let groups = group_by_workspace(sessions);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].total_in_workspace, 2);
        assert_eq!(groups[0].latest.log_path, "2026-07-30_session.md");
    }
}
