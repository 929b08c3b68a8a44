pub mod error;
pub mod id;
pub mod logger;
pub mod model;
pub mod recovery;
pub mod retention;

pub use error::{Error, Result};
pub use id::stable_session_id;
pub use logger::SessionLogger;
pub use model::{EntryType, GroupedSessionInfo, SessionInfo};
pub use recovery::{group_by_workspace, scan_recoverable};
pub use retention::{archive_session_log, prune_archive};
