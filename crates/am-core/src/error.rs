use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("conversation has no turns, refusing to persist: {0}")]
    EmptyConversation(String),

    #[error("persist failed for {path}: {source}")]
    Persist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialize failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
