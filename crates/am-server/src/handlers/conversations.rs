use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;

use am_core::LlmConversation;

use crate::state::AppState;

#[derive(Serialize)]
struct ConversationsResponse {
    count: usize,
    conversations: Vec<LlmConversation>,
}

/// `GET /api/am/llm/conversations/:tabId` -> `{count, conversations}` (§6).
/// A tab with no logger yet (never saw LLM activity) returns an empty list,
/// not a 404 — an empty conversation history is a valid answer.
pub async fn handler(state: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let tab_id = path.into_inner();
    let conversations = match state.logger_registry.get(&tab_id) {
        Some(logger) => logger.conversations().await,
        None => Vec::new(),
    };

    HttpResponse::Ok().json(ConversationsResponse {
        count: conversations.len(),
        conversations,
    })
}
