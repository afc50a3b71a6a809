use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::chatbot_service::ChatbotService;
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChatResponse {
    pub response: String,
}

/// POST /api/chatbot/chat
///
/// Always answers 200 once the message is non-empty; upstream failures are
/// replaced by a canned reply.
#[utoipa::path(
    post,
    path = "/api/chatbot/chat",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatResponse),
        (status = 400, description = "Message is required"),
    ),
    tag = "chatbot"
)]
pub async fn chat(
    chatbot: web::Data<ChatbotService>,
    body: web::Json<ChatRequest>,
) -> Result<HttpResponse, AppError> {
    let response = chatbot.reply(&body.message).await?;
    Ok(HttpResponse::Ok().json(ChatResponse { response }))
}
