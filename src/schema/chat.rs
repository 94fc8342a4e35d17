use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::Deserialize;

use super::common::ErrorResponse;

#[derive(Object, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

#[derive(Object, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "chat_bad_request")]
pub enum ChatResponses {
    #[oai(status = 200)]
    Ok(Json<ChatResponse>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorResponse>),
}

fn chat_bad_request(_err: poem::Error) -> ChatResponses {
    ChatResponses::BadRequest(Json(ErrorResponse::message("Invalid JSON body")))
}
