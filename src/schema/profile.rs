use poem::http::StatusCode;
use poem_openapi::{payload::Json, ApiResponse, Object};
use serde::Deserialize;

use super::common::{InternalServerErrorResponse, OkResponse, UnauthorizedResponse};
use crate::model::profile::Profile;

/// Profile as the onboarding screens see it. Unset choices are empty strings.
#[derive(Object, Deserialize)]
pub struct ProfileDetail {
    pub age_group: String,
    pub gender: String,
    pub region: String,
    pub style_keywords: String,
    pub consent_use_demographics: bool,
    pub onboarded: bool,
}

impl From<&Profile> for ProfileDetail {
    fn from(profile: &Profile) -> Self {
        Self {
            age_group: profile.age_group.clone().unwrap_or_default(),
            gender: profile.gender.clone().unwrap_or_default(),
            region: profile.region.clone().unwrap_or_default(),
            style_keywords: profile.style_keywords.clone(),
            consent_use_demographics: profile.consent_use_demographics,
            onboarded: profile.onboarded,
        }
    }
}

#[derive(Object, Deserialize)]
pub struct ProfileErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ProfileErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            ok: false,
            error: error.to_string(),
        }
    }
}

#[derive(Object, Deserialize)]
pub struct WorkshopResponse {
    pub should_onboard: bool,
}

#[derive(ApiResponse)]
pub enum WorkshopResponses {
    #[oai(status = 200)]
    Ok(Json<WorkshopResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(Object, Deserialize)]
pub struct SaveOnboardingResponse {
    pub ok: bool,
    pub onboarded: bool,
    pub profile: ProfileDetail,
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "save_onboarding_bad_request")]
pub enum SaveOnboardingResponses {
    #[oai(status = 200)]
    Ok(Json<SaveOnboardingResponse>),

    #[oai(status = 400)]
    BadRequest(Json<ProfileErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

fn save_onboarding_bad_request(err: poem::Error) -> SaveOnboardingResponses {
    if err.status() == StatusCode::UNAUTHORIZED {
        return SaveOnboardingResponses::Unauthorized(Json(UnauthorizedResponse::default()));
    }
    SaveOnboardingResponses::BadRequest(Json(ProfileErrorResponse::new("Invalid JSON.")))
}

#[derive(Object, Deserialize)]
pub struct ProfileResponse {
    pub ok: bool,
    pub profile: ProfileDetail,
}

#[derive(ApiResponse)]
pub enum ProfileResponses {
    #[oai(status = 200)]
    Ok(Json<ProfileResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

#[derive(ApiResponse)]
#[oai(bad_request_handler = "profile_save_bad_request")]
pub enum ProfileSaveResponses {
    #[oai(status = 200)]
    Ok(Json<OkResponse>),

    #[oai(status = 400)]
    BadRequest(Json<ProfileErrorResponse>),

    #[oai(status = 401)]
    Unauthorized(Json<UnauthorizedResponse>),

    #[oai(status = 500)]
    InternalServerError(Json<InternalServerErrorResponse>),
}

// missing bearer header lands here too
fn profile_save_bad_request(err: poem::Error) -> ProfileSaveResponses {
    if err.status() == StatusCode::UNAUTHORIZED {
        return ProfileSaveResponses::Unauthorized(Json(UnauthorizedResponse::default()));
    }
    ProfileSaveResponses::BadRequest(Json(ProfileErrorResponse::new("Invalid JSON.")))
}
