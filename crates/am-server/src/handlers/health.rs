use actix_web::{web, HttpResponse, Responder};

use crate::state::AppState;

/// `GET /api/am/health` -> `SystemHealth` (§6).
pub async fn handler(state: web::Data<AppState>) -> impl Responder {
    let health = state.health_monitor.snapshot().await;
    HttpResponse::Ok().json(health)
}
