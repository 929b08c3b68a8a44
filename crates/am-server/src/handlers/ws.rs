use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use pty_bridge::{PtyBridgeActor, PtySession, Shell};
use serde::Deserialize;
use std::sync::Arc;

use crate::state::AppState;

const DEFAULT_COLS: u16 = 80;
const DEFAULT_ROWS: u16 = 24;

/// Query string for the terminal WebSocket endpoint (§6). `tab` identifies
/// the `TabBridge` this connection belongs to — the distilled spec's query
/// string (`shell`, `distro`, `home`, `workdir`) never names how a
/// multi-tab server tells two connections apart, so this is supplemented
/// here as the obvious missing piece (see DESIGN.md).
#[derive(Deserialize)]
pub struct TerminalWsQuery {
    pub tab: String,
    pub shell: Option<String>,
    pub distro: Option<String>,
    pub home: Option<String>,
    pub workdir: Option<String>,
    #[serde(default)]
    pub autorespond: Option<bool>,
}

/// `GET /ws` (and `/ws/forge/terminal`). Spawns a shell under a PTY the
/// first time a tab connects; a reconnect for the same `tab` resubscribes
/// to the existing session rather than spawning a second one, guaranteeing
/// at-most-one live shell per tab (§3).
pub async fn handler(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
    query: web::Query<TerminalWsQuery>,
) -> Result<HttpResponse, Error> {
    let tab_id = query.tab.clone();

    let shell = match state.pty_shells.get(&tab_id) {
        Some(existing) => existing.value().clone(),
        None => Shell::from_query(query.shell.as_deref(), query.distro.as_deref(), query.home.as_deref()),
    };

    let session = match state.pty_sessions.get(&tab_id) {
        Some(existing) => existing.clone(),
        None => {
            let workdir = query
                .workdir
                .clone()
                .or_else(|| state.tab_cwd.get(&tab_id).map(|e| e.value().clone()));

            let spawned = PtySession::spawn(&shell, DEFAULT_COLS, DEFAULT_ROWS, workdir.as_deref())
                .map_err(|e| actix_web::error::ErrorInternalServerError(e.to_string()))?;
            let session = Arc::new(spawned);

            state.pty_sessions.insert(tab_id.clone(), session.clone());
            state.pty_shells.insert(tab_id.clone(), shell.clone());
            session
        }
    };

    let known_cwd = state.tab_cwd.get(&tab_id).map(|e| e.value().clone());
    let autorespond_enabled = query.autorespond.unwrap_or(state.config.autorespond);

    let tab_cwd = state.tab_cwd.clone();
    let cwd_callback: pty_bridge::CwdChangeCallback = Arc::new(move |tab, dir| {
        tab_cwd.insert(tab.to_string(), dir.to_string());
    });

    let actor = PtyBridgeActor::new(
        session,
        shell,
        tab_id,
        state.logger_registry.clone(),
        autorespond_enabled,
        known_cwd,
    )
    .with_cwd_change_callback(cwd_callback);

    ws::start(actor, &req, stream)
}
