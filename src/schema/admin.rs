use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::Deserialize;

use super::common::{
    BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse, PaginateResponse,
    UnauthorizedResponse,
};
use crate::service::notification::{Notice, NoticeLevel};

#[derive(Object, Deserialize)]
pub struct AdminUserDetail {
    pub id: String,
    pub user_name: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub onboarded: bool,
    pub last_login: Option<String>,
    pub created_date: Option<String>,
}

#[derive(ApiResponse)]
pub enum GetAdminUsersResponses {
    #[oai(status = 200)]
    Ok(Json<PaginateResponse<AdminUserDetail>>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct UserIdsRequest {
    pub user_ids: Vec<String>,
}

#[derive(Object, Deserialize)]
pub struct NoticeDetail {
    pub level: NoticeLevel,
    pub message: String,
}

impl From<Notice> for NoticeDetail {
    fn from(notice: Notice) -> Self {
        Self {
            level: notice.level,
            message: notice.message,
        }
    }
}

#[derive(Object, Deserialize)]
pub struct BulkEmailResponse {
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
    pub messages: Vec<NoticeDetail>,
}

#[derive(ApiResponse)]
pub enum BulkEmailResponses {
    #[oai(status = 200)]
    Ok(Json<BulkEmailResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct RequireOnboardingResponse {
    pub updated: u32,
    pub messages: Vec<NoticeDetail>,
}

#[derive(ApiResponse)]
pub enum RequireOnboardingResponses {
    #[oai(status = 200)]
    Ok(Json<RequireOnboardingResponse>),

    #[oai(status = 400)]
    BadRequest(Json<BadRequestResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 403)]
    Forbidden(Json<ForbiddenResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}
