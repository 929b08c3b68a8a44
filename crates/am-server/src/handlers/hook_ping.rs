use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

/// `POST /api/am/hook` — incoming shell-hook ping. Body is free-form; the
/// only effect is a layer-2 heartbeat (§4.7, §6).
pub async fn handler(state: web::Data<AppState>, body: web::Bytes) -> impl Responder {
    let _ = body;
    state.shell_hook.record_ping();
    HttpResponse::Ok().json(serde_json::json!({ "ok": true }))
}
