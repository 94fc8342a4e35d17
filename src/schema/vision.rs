use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::Deserialize;
use serde_json::Value;

use super::common::{ErrorResponse, InternalServerErrorResponse, UnauthorizedResponse};

#[derive(Object, Deserialize)]
pub struct GenerateVisionRequest {
    /// prompt
    pub vision: Option<String>,
    pub size: Option<String>,
    pub background: Option<String>,
}

#[derive(Object, Deserialize)]
pub struct GenerateVisionResponse {
    pub prompt: String,
    pub image_url: String,
    pub size: String,
    pub background: Option<String>,
    pub public_id: String,
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "generate_vision_bad_request")]
pub enum GenerateVisionResponses {
    #[oai(status = 200)]
    Ok(Json<GenerateVisionResponse>),

    #[oai(status = 400)]
    BadRequest(Json<ErrorResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<ErrorResponse>),

    #[oai(status = 502)]
    BadGateway(Json<ErrorResponse>),
}

fn generate_vision_bad_request(_err: poem::Error) -> GenerateVisionResponses {
    GenerateVisionResponses::BadRequest(Json(ErrorResponse::message("Invalid JSON body")))
}

#[derive(Object, Deserialize)]
pub struct VisionDetail {
    pub id: String,
    pub prompt: String,
    pub public_id: String,
    pub meta: Value,
    pub created_at: String,
}

#[derive(Object, Deserialize)]
pub struct VisionListResponse {
    pub ok: bool,
    pub visions: Vec<VisionDetail>,
}

#[derive(ApiResponse)]
pub enum VisionListResponses {
    #[oai(status = 200)]
    Ok(Json<VisionListResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
