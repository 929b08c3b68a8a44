use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;

use crate::model::ValidationReport;

const MAX_ERRORS: usize = 5;
const MIN_TOTAL_CONTENT_CHARS: usize = 10;

static ANSI_ARTIFACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\x1b|\[\??[0-9;]*[a-zA-Z]").expect("valid regex"));

/// Scan every `llm-conv-*.json` file under `am_dir` and report how many
/// parse cleanly and pass the ANSI-artifact / minimum-content checks. Only
/// the first `MAX_ERRORS` error strings are kept, bounding metrics memory.
pub async fn validate_all_conversations(am_dir: &Path) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut entries = match fs::read_dir(am_dir).await {
        Ok(entries) => entries,
        Err(_) => return report,
    };

    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !basename.starts_with("llm-conv-") || !basename.ends_with(".json") {
            continue;
        }

        report.total += 1;

        match validate_one(&path).await {
            Ok(()) => report.valid += 1,
            Err(reason) => {
                report.corrupted += 1;
                if report.errors.len() < MAX_ERRORS {
                    report.errors.push(format!("{basename}: {reason}"));
                }
            }
        }
    }

    report
}

async fn validate_one(path: &Path) -> Result<(), String> {
    let bytes = fs::read(path).await.map_err(|e| format!("io error: {e}"))?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).map_err(|e| format!("parse error: {e}"))?;

    let turns = value
        .get("turns")
        .and_then(|t| t.as_array())
        .ok_or_else(|| "missing turns array".to_string())?;

    if turns.is_empty() {
        return Err("zero turns".to_string());
    }

    let mut total_content_len = 0usize;
    for turn in turns {
        let content = turn
            .get("content")
            .and_then(|c| c.as_str())
            .unwrap_or_default();

        if ANSI_ARTIFACT.is_match(content) {
            return Err("turn content contains ANSI artifacts".to_string());
        }

        total_content_len += content.trim().len();
    }

    if total_content_len < MIN_TOTAL_CONTENT_CHARS {
        return Err("total trimmed content below minimum length".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    async fn write_conv(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).await.unwrap();
    }

    #[tokio::test]
    async fn empty_directory_reports_zero_files() {
        let dir = tempdir().unwrap();
        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn valid_conversation_is_counted_valid() {
        let dir = tempdir().unwrap();
        write_conv(
            dir.path(),
            "llm-conv-t1-c1.json",
            r#"{"turns":[{"content":"a perfectly normal reply here"}]}"#,
        )
        .await;

        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.total, 1);
        assert_eq!(report.valid, 1);
        assert_eq!(report.corrupted, 0);
    }

    #[tokio::test]
    async fn ansi_artifact_marks_file_corrupted() {
        let dir = tempdir().unwrap();
        write_conv(
            dir.path(),
            "llm-conv-t-x.json",
            "{\"turns\":[{\"content\":\"\u{1b}[?25l welcome \u{1b}[?25h\"}]}",
        )
        .await;

        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.total, 1);
        assert_eq!(report.valid, 0);
        assert_eq!(report.corrupted, 1);
        assert!(report.errors[0].contains("llm-conv-t-x.json"));
    }

    #[tokio::test]
    async fn malformed_json_is_corrupted() {
        let dir = tempdir().unwrap();
        write_conv(dir.path(), "llm-conv-t1-c2.json", "{not json").await;

        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.corrupted, 1);
    }

    #[tokio::test]
    async fn non_conversation_files_are_ignored() {
        let dir = tempdir().unwrap();
        write_conv(dir.path(), "session.md", "irrelevant").await;

        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.total, 0);
    }

    #[tokio::test]
    async fn error_list_is_capped_at_five() {
        let dir = tempdir().unwrap();
        for i in 0..8 {
            write_conv(dir.path(), &format!("llm-conv-t{i}-c{i}.json"), "{bad").await;
        }

        let report = validate_all_conversations(dir.path()).await;
        assert_eq!(report.total, 8);
        assert_eq!(report.corrupted, 8);
        assert_eq!(report.errors.len(), 5);
    }
}
