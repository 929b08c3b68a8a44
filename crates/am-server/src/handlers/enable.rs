use actix_web::{web, HttpResponse, Responder};
use serde::Deserialize;

use crate::session_registry;
use crate::state::AppState;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnableRequest {
    pub tab_id: String,
    pub tab_name: String,
    pub workspace: String,
    pub enabled: bool,
}

/// `POST /api/am/enable` -> toggle whether the tab's session log is shown
/// in the UI. Capture is unaffected either way (§4.9).
pub async fn handler(state: web::Data<AppState>, req: web::Json<EnableRequest>) -> impl Responder {
    let logger = match session_registry::get_or_create(
        &state,
        &req.tab_id,
        &req.tab_name,
        &req.workspace,
        req.enabled,
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

    logger.set_enabled(req.enabled);
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "enabled": req.enabled }))
}
