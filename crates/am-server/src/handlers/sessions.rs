use actix_web::{web, HttpResponse, Responder};
use tokio::fs;

use crate::state::AppState;

/// `GET /api/sessions` -> the opaque tab-list/active-id blob the UI
/// persists. Not part of the core's semantics (§1 scope note): this is a
/// plain key/value JSON passthrough, not parsed or validated here.
pub async fn get(state: web::Data<AppState>) -> impl Responder {
    let blob = state.sessions_blob.lock().await;
    HttpResponse::Ok().json(&*blob)
}

/// `POST /api/sessions` -> overwrite the blob and persist it to disk.
pub async fn post(state: web::Data<AppState>, body: web::Json<serde_json::Value>) -> impl Responder {
    let mut blob = state.sessions_blob.lock().await;
    *blob = body.into_inner();

    if let Some(parent) = state.sessions_blob_path.parent() {
        let _ = fs::create_dir_all(parent).await;
    }

    let serialized = match serde_json::to_vec_pretty(&*blob) {
        Ok(bytes) => bytes,
        Err(err) => {
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "error": err.to_string() }))
        }
    };

    if let Err(err) = fs::write(&state.sessions_blob_path, serialized).await {
        tracing::warn!(error = %err, "failed to persist sessions blob");
        return HttpResponse::InternalServerError()
            .json(serde_json::json!({ "success": false, "error": err.to_string() }));
    }

    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}
