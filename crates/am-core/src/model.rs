use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMethod {
    PtyInput,
    PtyOutput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Chat,
    Suggest,
    Explain,
    Unknown,
}

/// One role-tagged exchange in a conversation. Immutable once appended.
///
/// `raw` is a lossy UTF-8 rendering of the original terminal bytes, kept
/// only for forensic inspection; it is not guaranteed to round-trip to the
/// exact bytes the PTY produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub provider: String,
    pub raw: String,
    pub capture_method: CaptureMethod,
    pub parse_confidence: Option<f32>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>, provider: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            timestamp: Utc::now(),
            provider: provider.into(),
            raw: raw.into(),
            capture_method: CaptureMethod::PtyInput,
            parse_confidence: None,
        }
    }

    pub fn assistant(
        content: impl Into<String>,
        provider: impl Into<String>,
        raw: impl Into<String>,
        confidence: f32,
    ) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            provider: provider.into(),
            raw: raw.into(),
            capture_method: CaptureMethod::PtyOutput,
            parse_confidence: Some(confidence),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMetadata {
    pub working_directory: Option<String>,
    pub git_branch: Option<String>,
    pub shell_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryInfo {
    pub last_saved_turn: Option<usize>,
    pub can_restore: bool,
    pub suggested_restore_prompt: Option<String>,
}

/// An ordered sequence of turns between one user and one LLM CLI within one
/// tab, delimited by LLM_START/LLM_END.
///
/// Invariant: turns alternate in intent but not strictly in role — bursts of
/// consecutive assistant turns are allowed, consecutive user turns are not
/// (a new user turn must flush any pending assistant buffer first, enforced
/// by the owning logger, not by this type). A conversation with zero turns
/// must never be persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConversation {
    pub conversation_id: String,
    pub tab_id: String,
    pub provider: String,
    pub command_type: CommandType,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub turns: Vec<ConversationTurn>,
    pub complete: bool,
    pub auto_respond: bool,
    pub metadata: ConversationMetadata,
    pub recovery: RecoveryInfo,
}

impl LlmConversation {
    pub fn new(
        conversation_id: impl Into<String>,
        tab_id: impl Into<String>,
        provider: impl Into<String>,
        command_type: CommandType,
        auto_respond: bool,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            tab_id: tab_id.into(),
            provider: provider.into(),
            command_type,
            start_time: Utc::now(),
            end_time: None,
            turns: Vec::new(),
            complete: false,
            auto_respond,
            metadata: ConversationMetadata::default(),
            recovery: RecoveryInfo::default(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("llm-conv-{}-{}.json", self.tab_id, self.conversation_id)
    }

    /// The last non-consecutive-user-turn check lives in the logger (which
    /// knows about pending buffers); this is a cheap structural guard for
    /// callers that only have the conversation in hand.
    pub fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|t| t.role)
    }
}
