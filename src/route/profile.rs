use std::sync::Arc;

use chrono::Utc;
use poem::web::Data;
use poem_openapi::{payload::Json, OpenApi, Tags};
use serde_json::Value;

use crate::{
    core::security::{get_user_from_token, BearerAuthorization},
    repository::profile::{get_or_create_profile, update_profile},
    schema::{
        common::{InternalServerErrorResponse, OkResponse, UnauthorizedResponse},
        profile::{
            ProfileDetail, ProfileErrorResponse, ProfileResponse, ProfileResponses,
            ProfileSaveResponses, SaveOnboardingResponse, SaveOnboardingResponses,
            WorkshopResponse, WorkshopResponses,
        },
    },
    service::profile::{apply_onboarding, apply_profile_save},
    AppState,
};

#[derive(Tags)]
enum ApiProfileTags {
    Profile,
}

pub struct ApiProfile;

#[OpenApi]
impl ApiProfile {
    #[oai(path = "/workshop/", method = "get", tag = "ApiProfileTags::Profile")]
    async fn workshop_api(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> WorkshopResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return WorkshopResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "workshop_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return WorkshopResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "workshop_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let user = match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
            Ok(val) => val,
            Err(err) => {
                return WorkshopResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "workshop_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return WorkshopResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let (profile, _) = match get_or_create_profile(&mut tx, &user.id).await {
            Ok(val) => val,
            Err(err) => {
                return WorkshopResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "workshop_api",
                        "get_or_create_profile",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if let Err(err) = tx.commit().await {
            return WorkshopResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.profile",
                "workshop_api",
                "commit transaction",
                &err.to_string(),
            )));
        }

        WorkshopResponses::Ok(Json(WorkshopResponse {
            should_onboard: !profile.onboarded,
        }))
    }

    #[oai(path = "/save-onboarding/", method = "post", tag = "ApiProfileTags::Profile")]
    async fn save_onboarding_api(
        &self,
        json: Json<Value>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> SaveOnboardingResponses {
        let Some(body) = json.0.as_object() else {
            return SaveOnboardingResponses::BadRequest(Json(ProfileErrorResponse::new(
                "Invalid JSON.",
            )));
        };

        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return SaveOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_onboarding_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return SaveOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_onboarding_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let user = match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
            Ok(val) => val,
            Err(err) => {
                return SaveOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_onboarding_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return SaveOnboardingResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let (mut profile, _) = match get_or_create_profile(&mut tx, &user.id).await {
            Ok(val) => val,
            Err(err) => {
                return SaveOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_onboarding_api",
                        "get_or_create_profile",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if let Err(err) = apply_onboarding(&mut profile, body) {
            return SaveOnboardingResponses::BadRequest(Json(ProfileErrorResponse::new(
                &err.to_string(),
            )));
        }
        if let Err(err) = update_profile(&mut tx, &mut profile, &Utc::now()).await {
            return SaveOnboardingResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.profile",
                    "save_onboarding_api",
                    "update_profile",
                    &err.to_string(),
                ),
            ));
        }
        if let Err(err) = tx.commit().await {
            return SaveOnboardingResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.profile",
                    "save_onboarding_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        tracing::info!("user {} finished onboarding", user.user_name);

        SaveOnboardingResponses::Ok(Json(SaveOnboardingResponse {
            ok: true,
            onboarded: profile.onboarded,
            profile: ProfileDetail::from(&profile),
        }))
    }

    #[oai(path = "/api/profile/", method = "get", tag = "ApiProfileTags::Profile")]
    async fn get_profile_api(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return ProfileResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "get_profile_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return ProfileResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "get_profile_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let user = match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
            Ok(val) => val,
            Err(err) => {
                return ProfileResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "get_profile_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return ProfileResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let (profile, _) = match get_or_create_profile(&mut tx, &user.id).await {
            Ok(val) => val,
            Err(err) => {
                return ProfileResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "get_profile_api",
                        "get_or_create_profile",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if let Err(err) = tx.commit().await {
            return ProfileResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.profile",
                "get_profile_api",
                "commit transaction",
                &err.to_string(),
            )));
        }

        ProfileResponses::Ok(Json(ProfileResponse {
            ok: true,
            profile: ProfileDetail::from(&profile),
        }))
    }

    #[oai(path = "/api/profile/save/", method = "post", tag = "ApiProfileTags::Profile")]
    async fn save_profile_api(
        &self,
        json: Json<Value>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> ProfileSaveResponses {
        let Some(body) = json.0.as_object() else {
            return ProfileSaveResponses::BadRequest(Json(ProfileErrorResponse::new(
                "Invalid JSON.",
            )));
        };

        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return ProfileSaveResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_profile_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // get redis conn from pool
        let mut redis_conn = match state.redis_conn.get() {
            Ok(val) => val,
            Err(err) => {
                return ProfileSaveResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_profile_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let user = match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
            Ok(val) => val,
            Err(err) => {
                return ProfileSaveResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_profile_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return ProfileSaveResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let (mut profile, _) = match get_or_create_profile(&mut tx, &user.id).await {
            Ok(val) => val,
            Err(err) => {
                return ProfileSaveResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.profile",
                        "save_profile_api",
                        "get_or_create_profile",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if let Err(err) = apply_profile_save(&mut profile, body) {
            return ProfileSaveResponses::BadRequest(Json(ProfileErrorResponse::new(
                &err.to_string(),
            )));
        }
        if let Err(err) = update_profile(&mut tx, &mut profile, &Utc::now()).await {
            return ProfileSaveResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.profile",
                    "save_profile_api",
                    "update_profile",
                    &err.to_string(),
                ),
            ));
        }
        if let Err(err) = tx.commit().await {
            return ProfileSaveResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.profile",
                    "save_profile_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }

        ProfileSaveResponses::Ok(Json(OkResponse { ok: true }))
    }
}
