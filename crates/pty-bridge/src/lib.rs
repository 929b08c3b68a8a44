pub mod auth_url;
pub mod autorespond;
pub mod bridge;
pub mod cwd_detect;
pub mod error;
pub mod session;
pub mod shell;

pub use bridge::{CwdChangeCallback, PtyBridgeActor};
pub use error::{Error, Result};
pub use session::{PtyEvent, PtySession};
pub use shell::{Shell, TerminalQuery};
