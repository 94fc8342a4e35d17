use std::sync::Arc;

use poem::{http::StatusCode, web::Data};
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::{
    schema::{
        chat::{ChatRequest, ChatResponse, ChatResponses},
        common::ErrorResponse,
    },
    service::chat::relay_chat,
    AppState,
};

#[derive(Tags)]
enum ApiChatTags {
    Chat,
}

pub struct ApiChat;

#[OpenApi]
impl ApiChat {
    #[oai(path = "/chat-ai/", method = "post", tag = "ApiChatTags::Chat")]
    async fn chat_ai(&self, json: Json<ChatRequest>, state: Data<&Arc<AppState>>) -> ChatResponses {
        match relay_chat(state.providers.chat.as_ref(), json.message.as_deref()).await {
            Ok(reply) => ChatResponses::Ok(Json(ChatResponse { reply })),
            Err(err) if err.status() == StatusCode::BAD_REQUEST => {
                ChatResponses::BadRequest(Json(ErrorResponse::message(&err.to_string())))
            }
            Err(err) => ChatResponses::InternalServerError(Json(ErrorResponse::message(
                &err.to_string(),
            ))),
        }
    }
}
