use actix_web::{web, HttpResponse, Responder};
use am_health::validate_all_conversations;

use crate::state::AppState;

/// `POST /api/am/validate` -> `ValidationReport`. Supplemented per
/// SPEC_FULL §6: §4.8's content validation is exercised on demand here,
/// not only during the periodic health tick. The run's counts are folded
/// into the health monitor's metrics so `GET /api/am/health` reflects them
/// (§4.8, §7).
pub async fn handler(state: web::Data<AppState>) -> impl Responder {
    let report = validate_all_conversations(&state.am_dir).await;
    state.health_monitor.record_validation(&report).await;
    HttpResponse::Ok().json(report)
}
