pub mod error;
pub mod fs_watcher;
pub mod process_monitor;
pub mod shell_hook;

pub use error::{Error, Result};
pub use fs_watcher::FsWatcher;
pub use process_monitor::ProcessMonitor;
pub use shell_hook::{apply, preview, remove, restore_from_backup, snippet, AppliedHook, Shell, ShellHookLayer};
