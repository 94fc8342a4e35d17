use std::sync::Arc;

use chrono::{Duration, Utc};
use poem::web::Data;
use poem_openapi::{payload::Json, OpenApi, Tags};

use crate::{
    core::{
        security::{
            generate_refresh_token_from_user, generate_token_from_user,
            get_user_from_refresh_token, get_user_from_token, verify_hash_password,
            BearerAuthorization,
        },
        session::{add_session, remove_session},
        utils::datetime_to_string,
    },
    model::user::User,
    repository::user::{get_user_by_username, get_users_by_email, update_last_login},
    schema::{
        auth::{
            LoginRequest, LoginResponse, LoginResponses, LogoutResponses, RefreshTokenRequest,
            RefreshTokenResponses,
        },
        common::{BadRequestResponse, InternalServerErrorResponse, UnauthorizedResponse},
    },
    settings::Config,
    AppState,
};

#[derive(Tags)]
enum ApiAuthTags {
    Auth,
}

pub struct ApiAuth;

fn token_response(config: &Config, token: String, refresh_token: String) -> LoginResponse {
    let now = Utc::now();
    let exp = now + Duration::minutes(config.jwt_exp as i64);
    let exp_refresh_token = now + Duration::minutes(config.jwt_refresh_exp as i64);
    LoginResponse {
        exp: datetime_to_string(exp),
        exp_in: config.jwt_exp as i64 * 60,
        exp_refresh_token: datetime_to_string(exp_refresh_token),
        refresh_token,
        token,
        token_type: "Bearer".to_string(),
    }
}

#[OpenApi]
impl ApiAuth {
    #[oai(path = "/auth/login", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_login(
        &self,
        json: Json<LoginRequest>,
        state: Data<&Arc<AppState>>,
    ) -> LoginResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
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
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "get redis pool connection",
                    &err.to_string(),
                )))
            }
        };

        // user name first, then the first active account with that email
        let login = json.user_name.trim();
        let mut candidates: Vec<User> = vec![];
        match get_user_by_username(&mut tx, login).await {
            Ok(val) => candidates.extend(val),
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "check user on database",
                        &err.to_string(),
                    ),
                ));
            }
        };
        match get_users_by_email(&mut tx, login).await {
            Ok(val) => candidates.extend(val.into_iter().find(|x| x.is_active)),
            Err(err) => {
                return LoginResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_login",
                        "check email on database",
                        &err.to_string(),
                    ),
                ));
            }
        };

        // validate user password
        let mut user: Option<User> = None;
        for candidate in candidates.into_iter().filter(|x| x.is_active) {
            match verify_hash_password(&json.password, &candidate.password) {
                Ok(true) => {
                    user = Some(candidate);
                    break;
                }
                Ok(false) => {}
                Err(err) => {
                    return LoginResponses::InternalServerError(Json(
                        InternalServerErrorResponse::new(
                            "route.auth",
                            "auth_login",
                            "validate user password",
                            &err.to_string(),
                        ),
                    ))
                }
            }
        }
        let Some(mut user) = user else {
            return LoginResponses::BadRequest(Json(BadRequestResponse {
                message: "Invalid credentials".to_string(),
            }));
        };

        let config = &state.config;
        let token = match generate_token_from_user(&user, config) {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "generate token",
                    &err.to_string(),
                )))
            }
        };

        let refresh_token = match generate_refresh_token_from_user(&user, config) {
            Ok(val) => val,
            Err(err) => {
                return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_login",
                    "generate refresh token",
                    &err.to_string(),
                )))
            }
        };

        if let Err(err) = add_session(&mut redis_conn, &user, config, &token, &refresh_token) {
            return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_login",
                "add_session to redis",
                &err.to_string(),
            )));
        }

        if let Err(err) = update_last_login(&mut tx, &mut user, &Utc::now()).await {
            return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_login",
                "update last login",
                &err.to_string(),
            )));
        }
        if let Err(err) = tx.commit().await {
            return LoginResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_login",
                "commit transaction",
                &err.to_string(),
            )));
        }
        tracing::info!("user {} logged in", user.user_name);

        LoginResponses::Ok(Json(token_response(config, token, refresh_token)))
    }

    #[oai(
        path = "/auth/refresh-token",
        method = "post",
        tag = "ApiAuthTags::Auth"
    )]
    async fn auth_refresh_token(
        &self,
        json: Json<RefreshTokenRequest>,
        state: Data<&Arc<AppState>>,
    ) -> RefreshTokenResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
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
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        let config = &state.config;
        let user = match get_user_from_refresh_token(&mut tx, &json.refresh_token, config).await {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "get user from refresh token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return RefreshTokenResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let token = match generate_token_from_user(&user, config) {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "generate token",
                        &err.to_string(),
                    ),
                ))
            }
        };

        let refresh_token = match generate_refresh_token_from_user(&user, config) {
            Ok(val) => val,
            Err(err) => {
                return RefreshTokenResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_refresh_token",
                        "generate refresh token",
                        &err.to_string(),
                    ),
                ))
            }
        };

        if let Err(err) = add_session(&mut redis_conn, &user, config, &token, &refresh_token) {
            return RefreshTokenResponses::InternalServerError(Json(
                InternalServerErrorResponse::new(
                    "route.auth",
                    "auth_refresh_token",
                    "add_session to redis",
                    &err.to_string(),
                ),
            ));
        }

        RefreshTokenResponses::Ok(Json(token_response(config, token, refresh_token)))
    }

    #[oai(path = "/auth/logout", method = "post", tag = "ApiAuthTags::Auth")]
    async fn auth_logout(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> LogoutResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
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
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
                        "get redis pool connection",
                        &err.to_string(),
                    ),
                ))
            }
        };

        // Validate user token
        let jwt_token = auth.0.token.unwrap_or_default();
        let user = match get_user_from_token(&mut tx, &mut redis_conn, Some(jwt_token.clone()))
            .await
        {
            Ok(val) => val,
            Err(err) => {
                return LogoutResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.auth",
                        "auth_logout",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        if user.is_none() {
            return LogoutResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        }
        if let Err(err) = remove_session(&mut redis_conn, &jwt_token) {
            return LogoutResponses::InternalServerError(Json(InternalServerErrorResponse::new(
                "route.auth",
                "auth_logout",
                "remove session",
                &err.to_string(),
            )));
        }
        LogoutResponses::NoContent
    }
}
