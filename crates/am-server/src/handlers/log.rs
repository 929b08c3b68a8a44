use actix_web::{web, HttpResponse, Responder};
use am_session::EntryType;
use serde::Deserialize;

use crate::session_registry;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRequest {
    pub tab_id: String,
    pub tab_name: String,
    pub workspace: String,
    pub entry_type: EntryType,
    #[serde(default)]
    pub content: String,
}

/// `POST /api/am/log` -> append to the tab's session log (§6, §4.9).
/// Capture happens regardless of whether the tab's log display is enabled;
/// this endpoint only ever appends.
pub async fn handler(state: web::Data<AppState>, req: web::Json<LogRequest>) -> impl Responder {
    let logger = match session_registry::get_or_create(
        &state,
        &req.tab_id,
        &req.tab_name,
        &req.workspace,
        true,
    )
    .await
    {
        Ok(logger) => logger,
        Err(err) => {
            tracing::warn!(error = %err, tab_id = %req.tab_id, "failed to open session logger");
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "success": false,
                "error": err.to_string(),
            }));
        }
    };

    if let Err(err) = logger.append(req.entry_type, &req.content).await {
        tracing::warn!(error = %err, tab_id = %req.tab_id, "session log append failed");
        return HttpResponse::InternalServerError().json(serde_json::json!({
            "success": false,
            "error": err.to_string(),
        }));
    }

    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}
