use std::path::Path;
use std::sync::Arc;

use am_session::{Error, SessionLogger};

use crate::state::AppState;

/// Return the tab's `SessionLogger`, creating it (under the creation lock,
/// so two first-touch requests for the same tab can't create two files) if
/// this is the first request seen for that tab.
pub async fn get_or_create(
    state: &AppState,
    tab_id: &str,
    tab_name: &str,
    workspace: &str,
    enabled: bool,
) -> Result<Arc<SessionLogger>, Error> {
    if let Some(existing) = state.session_loggers.get(tab_id) {
        return Ok(existing.clone());
    }

    let _guard = state.session_logger_creation_lock.lock().await;
    if let Some(existing) = state.session_loggers.get(tab_id) {
        return Ok(existing.clone());
    }

    let am_dir: &Path = &state.am_dir;
    let logger = Arc::new(SessionLogger::create(am_dir, tab_id, tab_name, workspace, enabled).await?);
    state.session_loggers.insert(tab_id.to_string(), logger.clone());
    Ok(logger)
}
