use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    SessionStarted,
    UserInput,
    AgentOutput,
    CommandExecuted,
    FileCreated,
    FileModified,
    Error,
    SessionEnded,
    Interrupted,
}

impl EntryType {
    pub fn marker(self) -> &'static str {
        match self {
            EntryType::SessionStarted => "SESSION_STARTED",
            EntryType::UserInput => "USER_INPUT",
            EntryType::AgentOutput => "AGENT_OUTPUT",
            EntryType::CommandExecuted => "COMMAND_EXECUTED",
            EntryType::FileCreated => "FILE_CREATED",
            EntryType::FileModified => "FILE_MODIFIED",
            EntryType::Error => "ERROR",
            EntryType::SessionEnded => "SESSION_ENDED",
            EntryType::Interrupted => "INTERRUPTED",
        }
    }
}

/// A recoverable session discovered by scanning the AM directory for log
/// files that never reached a `[SESSION_ENDED]` marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: String,
    pub tab_id: String,
    pub workspace: String,
    pub log_path: String,
    pub last_command: Option<String>,
    pub llm_start_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedSessionInfo {
    pub workspace: String,
    pub latest: SessionInfo,
    pub total_in_workspace: usize,
}
