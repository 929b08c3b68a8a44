use std::path::{Path, PathBuf};

use am_core::{Error, LlmConversation, Result};
use tokio::fs;

pub fn conversation_path(am_dir: &Path, conv: &LlmConversation) -> PathBuf {
    am_dir.join(conv.file_name())
}

/// Write a conversation as JSON, atomic from the reader's point of view:
/// write to a sibling temp file, then rename over the final path. A reader
/// racing the write only ever sees the prior committed state or the next
/// one, never a partial file.
///
/// A conversation with zero turns is never persisted (§3 invariant) —
/// callers are free to call this unconditionally; the no-op is silent.
pub async fn persist_conversation(am_dir: &Path, conv: &LlmConversation) -> Result<()> {
    if conv.turns.is_empty() {
        tracing::debug!(
            conversation_id = %conv.conversation_id,
            "skipping persist of conversation with zero turns"
        );
        return Ok(());
    }

    fs::create_dir_all(am_dir).await?;

    let path = conversation_path(am_dir, conv);
    let tmp_path = path.with_extension("json.tmp");

    let json = serde_json::to_vec_pretty(conv)?;
    fs::write(&tmp_path, &json).await.map_err(|source| Error::Persist {
        path: tmp_path.display().to_string(),
        source,
    })?;
    fs::rename(&tmp_path, &path).await.map_err(|source| Error::Persist {
        path: path.display().to_string(),
        source,
    })?;

    Ok(())
}

pub async fn load_conversation(path: &Path) -> Result<LlmConversation> {
    let bytes = fs::read(path).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use am_core::{CommandType, ConversationTurn};
    use tempfile::tempdir;

    #[tokio::test]
    async fn zero_turn_conversation_is_not_written() {
        let dir = tempdir().unwrap();
        let conv = LlmConversation::new("c1", "t1", "claude", CommandType::Chat, false);
        persist_conversation(dir.path(), &conv).await.unwrap();
        assert!(!conversation_path(dir.path(), &conv).exists());
    }

    #[tokio::test]
    async fn persist_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let mut conv = LlmConversation::new("c1", "t1", "claude", CommandType::Chat, false);
        conv.turns.push(ConversationTurn::user("hello", "claude", "hello"));

        persist_conversation(dir.path(), &conv).await.unwrap();
        let path = conversation_path(dir.path(), &conv);
        assert!(path.exists());
        assert!(!path.with_extension("json.tmp").exists());

        let loaded = load_conversation(&path).await.unwrap();
        assert_eq!(loaded.conversation_id, "c1");
        assert_eq!(loaded.turns.len(), 1);
    }
}
