use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::Deserialize;

use super::common::{BadRequestResponse, InternalServerErrorResponse, OkResponse};

#[derive(Object, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(ApiResponse)]
pub enum PasswordResetResponses {
    #[oai(status = 200)]
    Ok(Json<OkResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct ResetLinkResponse {
    pub valid: bool,
}

#[derive(ApiResponse)]
pub enum ResetLinkResponses {
    #[oai(status = 200)]
    Ok(Json<ResetLinkResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct SetPasswordRequest {
    pub new_password: String,
}

#[derive(ApiResponse)]
pub enum SetPasswordResponses {
    #[oai(status = 200)]
    Ok(Json<OkResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
