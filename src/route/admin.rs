use std::{collections::HashMap, sync::Arc};

use chrono::Utc;
use poem::{web::Data, Request};
use poem_openapi::{param::Query, payload::Json, OpenApi, Tags};
use uuid::Uuid;

use crate::{
    core::{
        security::{get_user_from_token, BearerAuthorization},
        utils::datetime_to_string_opt,
    },
    repository::{
        profile::{get_or_create_profile, get_profiles_by_user_ids, update_profile},
        user::{get_all_user, get_users_by_ids},
    },
    schema::{
        admin::{
            AdminUserDetail, BulkEmailResponse, BulkEmailResponses, GetAdminUsersResponses,
            NoticeDetail, RequireOnboardingResponse, RequireOnboardingResponses,
            UserIdsRequest,
        },
        common::{
            BadRequestResponse, ForbiddenResponse, InternalServerErrorResponse,
            PaginateResponse, UnauthorizedResponse,
        },
    },
    service::notification::{send_password_set_emails, LinkContext, Notice, NoticeLevel},
    AppState,
};

#[derive(Tags)]
enum ApiAdminTags {
    Admin,
}

pub struct ApiAdmin;

fn parse_user_ids(ids: &[String]) -> Result<Vec<Uuid>, String> {
    ids.iter()
        .map(|x| Uuid::parse_str(x.trim()).map_err(|_| format!("invalid user id {}", x)))
        .collect()
}

#[OpenApi]
impl ApiAdmin {
    #[oai(path = "/admin/users/", method = "get", tag = "ApiAdminTags::Admin")]
    async fn get_admin_users_api(
        &self,
        Query(page): Query<Option<u32>>,
        Query(page_size): Query<Option<u32>>,
        Query(search): Query<Option<String>>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> GetAdminUsersResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return GetAdminUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "get_admin_users_api",
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
                return GetAdminUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "get_admin_users_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let request_user =
            match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
                Ok(val) => val,
                Err(err) => {
                    return GetAdminUsersResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.admin",
                            "get_admin_users_api",
                            "get user from token",
                            &err.to_string(),
                        ),
                    ))
                }
            };
        let Some(request_user) = request_user else {
            return GetAdminUsersResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !request_user.is_staff {
            return GetAdminUsersResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        let page = page.unwrap_or(1).max(1);
        let page_size = page_size.unwrap_or(20).max(1);
        let (data, counts, page_count) =
            match get_all_user(&mut tx, page, page_size, search).await {
                Ok(val) => val,
                Err(err) => {
                    return GetAdminUsersResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.admin",
                            "get_admin_users_api",
                            "get_all_user",
                            &err.to_string(),
                        ),
                    ))
                }
            };
        let ids: Vec<Uuid> = data.iter().map(|x| x.id).collect();
        let profiles = match get_profiles_by_user_ids(&mut tx, &ids).await {
            Ok(val) => val,
            Err(err) => {
                return GetAdminUsersResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "get_admin_users_api",
                        "get_profiles_by_user_ids",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let onboarded: HashMap<Uuid, bool> =
            profiles.iter().map(|x| (x.user_id, x.onboarded)).collect();

        let results = data
            .into_iter()
            .map(|item| AdminUserDetail {
                id: item.id.to_string(),
                onboarded: onboarded.get(&item.id).copied().unwrap_or(false),
                user_name: item.user_name,
                email: item.email,
                first_name: item.first_name,
                last_name: item.last_name,
                is_active: item.is_active,
                is_staff: item.is_staff,
                last_login: datetime_to_string_opt(item.last_login),
                created_date: datetime_to_string_opt(item.created_date),
            })
            .collect();

        GetAdminUsersResponses::Ok(Json(PaginateResponse {
            counts,
            page,
            page_count,
            page_size,
            results,
        }))
    }

    /// Emails a password-set link to each selected account.
    #[oai(
        path = "/admin/users/send-password-set-email/",
        method = "post",
        tag = "ApiAdminTags::Admin"
    )]
    async fn send_password_set_email_api(
        &self,
        req: &Request,
        json: Json<UserIdsRequest>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> BulkEmailResponses {
        let user_ids = match parse_user_ids(&json.user_ids) {
            Ok(val) => val,
            Err(message) => return BulkEmailResponses::BadRequest(Json(BadRequestResponse { message })),
        };

        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return BulkEmailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "send_password_set_email_api",
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
                return BulkEmailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "send_password_set_email_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let request_user =
            match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
                Ok(val) => val,
                Err(err) => {
                    return BulkEmailResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.admin",
                            "send_password_set_email_api",
                            "get user from token",
                            &err.to_string(),
                        ),
                    ))
                }
            };
        let Some(request_user) = request_user else {
            return BulkEmailResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !request_user.is_staff {
            return BulkEmailResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        let users = match get_users_by_ids(&mut tx, &user_ids).await {
            Ok(val) => val,
            Err(err) => {
                return BulkEmailResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "send_password_set_email_api",
                        "get_users_by_ids",
                        &err.to_string(),
                    ),
                ))
            }
        };
        drop(tx);

        tracing::info!(
            "{} requested password-set emails for {} user(s)",
            request_user.user_name,
            users.len()
        );
        let outcome = send_password_set_emails(
            state.providers.mailer.as_ref(),
            &state.config,
            &LinkContext::from_request(req, &state.config.site_settings()),
            &users,
        )
        .await;

        BulkEmailResponses::Ok(Json(BulkEmailResponse {
            sent: outcome.sent,
            skipped: outcome.skipped,
            failed: outcome.failed,
            messages: outcome.notices.into_iter().map(NoticeDetail::from).collect(),
        }))
    }

    /// Sends the selected accounts through onboarding again.
    #[oai(
        path = "/admin/users/require-onboarding/",
        method = "post",
        tag = "ApiAdminTags::Admin"
    )]
    async fn require_onboarding_api(
        &self,
        json: Json<UserIdsRequest>,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> RequireOnboardingResponses {
        let user_ids = match parse_user_ids(&json.user_ids) {
            Ok(val) => val,
            Err(message) => {
                return RequireOnboardingResponses::BadRequest(Json(BadRequestResponse { message }))
            }
        };

        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return RequireOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "require_onboarding_api",
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
                return RequireOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "require_onboarding_api",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let request_user =
            match get_user_from_token(&mut tx, &mut redis_conn, auth.0.token).await {
                Ok(val) => val,
                Err(err) => {
                    return RequireOnboardingResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.admin",
                            "require_onboarding_api",
                            "get user from token",
                            &err.to_string(),
                        ),
                    ))
                }
            };
        let Some(request_user) = request_user else {
            return RequireOnboardingResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };
        if !request_user.is_staff {
            return RequireOnboardingResponses::Forbidden(Json(ForbiddenResponse::default()));
        }

        let users = match get_users_by_ids(&mut tx, &user_ids).await {
            Ok(val) => val,
            Err(err) => {
                return RequireOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "require_onboarding_api",
                        "get_users_by_ids",
                        &err.to_string(),
                    ),
                ))
            }
        };

        let now = Utc::now();
        let mut updated = 0;
        for user in &users {
            let (mut profile, _) = match get_or_create_profile(&mut tx, &user.id).await {
                Ok(val) => val,
                Err(err) => {
                    return RequireOnboardingResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.admin",
                            "require_onboarding_api",
                            "get_or_create_profile",
                            &err.to_string(),
                        ),
                    ))
                }
            };
            profile.onboarded = false;
            if let Err(err) = update_profile(&mut tx, &mut profile, &now).await {
                return RequireOnboardingResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.admin",
                        "require_onboarding_api",
                        "update_profile",
                        &err.to_string(),
                    ),
                ));
            }
            updated += 1;
        }
        if let Err(err) = tx.commit().await {
            return RequireOnboardingResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.admin",
                    "require_onboarding_api",
                    "commit transaction",
                    &err.to_string(),
                ),
            ));
        }

        let notice = Notice {
            level: NoticeLevel::Success,
            message: format!("Marked {} user(s) to re-onboard.", updated),
        };
        RequireOnboardingResponses::Ok(Json(RequireOnboardingResponse {
            updated,
            messages: vec![NoticeDetail::from(notice)],
        }))
    }
}
