use std::sync::Arc;

use chrono::Utc;
use poem::{web::Data, Request};
use poem_openapi::{param::Path, payload::Json, OpenApi, Tags};

use crate::{
    core::security::{check_password_reset_token, decode_uid, hash_password},
    model::user::User,
    repository::user::{get_user_by_id, get_users_by_email, update_password},
    schema::{
        common::{BadRequestResponse, InternalServerErrorResponse, OkResponse},
        password_reset::{
            PasswordResetRequest, PasswordResetResponses, ResetLinkResponse, ResetLinkResponses,
            SetPasswordRequest, SetPasswordResponses,
        },
    },
    service::notification::{send_password_reset_email, LinkContext},
    AppState,
};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Tags)]
enum ApiPasswordResetTags {
    PasswordReset,
}

pub struct ApiPasswordReset;

/// The account a reset link points at, when the link is still valid.
async fn user_for_link(
    state: &AppState,
    uidb64: &str,
    token: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user_id) = decode_uid(uidb64) else {
        return Ok(None);
    };
    let mut tx = state.db.begin().await?;
    let user = get_user_by_id(&mut tx, &user_id).await?;
    Ok(user.filter(|x| x.is_active && check_password_reset_token(x, token, &state.config)))
}

#[OpenApi]
impl ApiPasswordReset {
    /// Always answers ok so the endpoint never reveals which addresses have accounts.
    #[oai(
        path = "/password-reset/",
        method = "post",
        tag = "ApiPasswordResetTags::PasswordReset"
    )]
    async fn password_reset_api(
        &self,
        req: &Request,
        json: Json<PasswordResetRequest>,
        state: Data<&Arc<AppState>>,
    ) -> PasswordResetResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return PasswordResetResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.password_reset",
                        "password_reset_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };

        let users = match get_users_by_email(&mut tx, json.email.trim()).await {
            Ok(val) => val,
            Err(err) => {
                return PasswordResetResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.password_reset",
                        "password_reset_api",
                        "get_users_by_email",
                        &err.to_string(),
                    ),
                ))
            }
        };
        drop(tx);

        let ctx = LinkContext::from_request(req, &state.config.site_settings());
        for user in users.iter().filter(|x| x.is_active) {
            send_password_reset_email(state.providers.mailer.as_ref(), &state.config, &ctx, user)
                .await;
        }
        PasswordResetResponses::Ok(Json(OkResponse { ok: true }))
    }

    #[oai(
        path = "/reset/:uidb64/:token/",
        method = "get",
        tag = "ApiPasswordResetTags::PasswordReset"
    )]
    async fn check_reset_link_api(
        &self,
        Path(uidb64): Path<String>,
        Path(token): Path<String>,
        state: Data<&Arc<AppState>>,
    ) -> ResetLinkResponses {
        match user_for_link(state.0, &uidb64, &token).await {
            Ok(user) => ResetLinkResponses::Ok(Json(ResetLinkResponse {
                valid: user.is_some(),
            })),
            Err(err) => ResetLinkResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.password_reset",
                    "check_reset_link_api",
                    "user_for_link",
                    &err.to_string(),
                ),
            )),
        }
    }

    #[oai(
        path = "/reset/:uidb64/:token/",
        method = "post",
        tag = "ApiPasswordResetTags::PasswordReset"
    )]
    async fn set_password_api(
        &self,
        Path(uidb64): Path<String>,
        Path(token): Path<String>,
        json: Json<SetPasswordRequest>,
        state: Data<&Arc<AppState>>,
    ) -> SetPasswordResponses {
        if json.new_password.chars().count() < MIN_PASSWORD_LEN {
            return SetPasswordResponses::BadRequest(Json(BadRequestResponse {
                message: format!(
                    "Password must be at least {} characters.",
                    MIN_PASSWORD_LEN
                ),
            }));
        }

        let user = match user_for_link(state.0, &uidb64, &token).await {
            Ok(val) => val,
            Err(err) => {
                return SetPasswordResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.password_reset",
                        "set_password_api",
                        "user_for_link",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(mut user) = user else {
            return SetPasswordResponses::BadRequest(Json(BadRequestResponse {
                message: "The password reset link is invalid or has expired.".to_string(),
            }));
        };

        let password_hash = match hash_password(&json.new_password) {
            Ok(val) => val,
            Err(err) => {
                return SetPasswordResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.password_reset",
                        "set_password_api",
                        "hash password",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return SetPasswordResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.password_reset",
                        "set_password_api",
                        "begin transaction",
                        &err.to_string(),
                    ),
                ));
            }
        };
        if let Err(err) = update_password(&mut tx, &mut user, password_hash, &Utc::now()).await {
            return SetPasswordResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.password_reset",
                    "set_password_api",
                    "update_password",
                    &err.to_string(),
                ),
            ));
        }
        if let Err(err) = tx.commit().await {
            return SetPasswordResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.password_reset",
                    "set_password_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }
        tracing::info!("password set for {}", user.user_name);

        SetPasswordResponses::Ok(Json(OkResponse { ok: true }))
    }
}
