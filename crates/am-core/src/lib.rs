pub mod ansi;
pub mod detector;
pub mod error;
pub mod event;
pub mod model;
pub mod parser;

pub use detector::{classify, DetectedCommand};
pub use error::{Error, Result};
pub use event::{
    EventBus, EventKind, LayerEvent, LayerId, LAYER_FS_WATCHER, LAYER_HEALTH_MONITOR,
    LAYER_PROCESS_MONITOR, LAYER_PTY, LAYER_SHELL_HOOK,
};
pub use model::{
    CaptureMethod, CommandType, ConversationMetadata, ConversationTurn, LlmConversation,
    RecoveryInfo, Role,
};
pub use parser::{clean_user_input, parse_assistant_output};
