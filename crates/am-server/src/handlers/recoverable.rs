use actix_web::{web, HttpResponse, Responder};
use am_session::{group_by_workspace, scan_recoverable};

use crate::state::AppState;

/// `GET /api/am/sessions/recoverable` -> `{sessions: [SessionInfo]}`.
/// Supplemented per SPEC_FULL §6: named by §4.9's recovery operation but
/// not given an endpoint in the distillation.
pub async fn list(state: web::Data<AppState>) -> impl Responder {
    let sessions = scan_recoverable(&state.am_dir).await;
    HttpResponse::Ok().json(serde_json::json!({ "sessions": sessions }))
}

/// `GET /api/am/sessions/recoverable/grouped` -> `{groups: [GroupedSessionInfo]}`.
pub async fn grouped(state: web::Data<AppState>) -> impl Responder {
    let sessions = scan_recoverable(&state.am_dir).await;
    let groups = group_by_workspace(sessions);
    HttpResponse::Ok().json(serde_json::json!({ "groups": groups }))
}
