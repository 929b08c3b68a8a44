pub mod logger;
pub mod registry;
pub mod storage;

pub use logger::{LlmLogger, LowConfidenceCallback};
pub use registry::LlmLoggerRegistry;
pub use storage::{conversation_path, load_conversation, persist_conversation};
