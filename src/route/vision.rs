use std::sync::Arc;

use chrono::Utc;
use poem::{http::StatusCode, web::Data, Request};
use poem_openapi::{payload::Json, OpenApi, Tags};
use sqlx::types::Json as SqlxJson;
use tracing::warn;
use uuid::Uuid;

use crate::{
    core::{
        error::ServiceError,
        security::{get_user_from_token, optional_bearer_token, BearerAuthorization},
        utils::datetime_to_string,
    },
    model::vision::Vision,
    repository::vision::{create_vision, get_visions_by_user},
    schema::{
        common::{ErrorResponse, InternalServerErrorResponse, UnauthorizedResponse},
        vision::{
            GenerateVisionRequest, GenerateVisionResponse, GenerateVisionResponses,
            VisionDetail, VisionListResponse, VisionListResponses,
        },
    },
    service::vision::{generate_vision, GeneratedVision, VisionRequest},
    AppState,
};

const VISION_LIST_LIMIT: u32 = 50;

#[derive(Tags)]
enum ApiVisionTags {
    Vision,
}

pub struct ApiVision;

fn service_error_response(err: ServiceError) -> GenerateVisionResponses {
    let body = Json(ErrorResponse::from(&err));
    match err.status() {
        StatusCode::BAD_REQUEST => GenerateVisionResponses::BadRequest(body),
        StatusCode::BAD_GATEWAY => GenerateVisionResponses::BadGateway(body),
        _ => GenerateVisionResponses::InternalServerError(body),
    }
}

/// Stores the vision for the signed-in caller. Returns false for anonymous
/// callers.
async fn persist_vision(
    state: &AppState,
    token: String,
    vision: &GeneratedVision,
) -> anyhow::Result<bool> {
    let mut tx = state.db.begin().await?;
    let mut redis_conn = state.redis_conn.get()?;
    let Some(user) = get_user_from_token(&mut tx, &mut redis_conn, Some(token)).await? else {
        return Ok(false);
    };
    let record = Vision {
        id: Uuid::now_v7(),
        user_id: user.id,
        prompt: vision.prompt.clone(),
        image: vision.public_id.clone(),
        meta: SqlxJson(vision.meta()),
        created_at: Utc::now(),
    };
    create_vision(&mut tx, &record).await?;
    tx.commit().await?;
    Ok(true)
}

#[OpenApi]
impl ApiVision {
    #[oai(path = "/generate-vision/", method = "post", tag = "ApiVisionTags::Vision")]
    async fn generate_vision_api(
        &self,
        req: &Request,
        json: Json<GenerateVisionRequest>,
        state: Data<&Arc<AppState>>,
    ) -> GenerateVisionResponses {
        let request = match VisionRequest::parse(
            json.vision.as_deref(),
            json.size.as_deref(),
            json.background.as_deref(),
        ) {
            Ok(val) => val,
            Err(err) => return service_error_response(err),
        };

        let vision = match generate_vision(
            state.providers.images.as_ref(),
            state.providers.storage.as_ref(),
            &request,
        )
        .await
        {
            Ok(val) => val,
            Err(err) => return service_error_response(err),
        };

        if let Some(token) = optional_bearer_token(req) {
            if let Err(err) = persist_vision(state.0, token, &vision).await {
                warn!("vision {} was not saved: {}", vision.public_id, err);
            }
        }

        GenerateVisionResponses::Ok(Json(GenerateVisionResponse {
            prompt: vision.prompt,
            image_url: vision.image_url,
            size: vision.size,
            background: vision.background,
            public_id: vision.public_id,
        }))
    }

    #[oai(path = "/api/visions/", method = "get", tag = "ApiVisionTags::Vision")]
    async fn list_visions_api(
        &self,
        state: Data<&Arc<AppState>>,
        auth: BearerAuthorization,
    ) -> VisionListResponses {
        // Begin db transaction
        let mut tx = match state.db.begin().await {
            Ok(val) => val,
            Err(err) => {
                return VisionListResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.vision",
                        "list_visions_api",
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
                return VisionListResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.vision",
                        "list_visions_api",
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
                return VisionListResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.vision",
                        "list_visions_api",
                        "get user from token",
                        &err.to_string(),
                    ),
                ))
            }
        };
        let Some(user) = user else {
            return VisionListResponses::Unauthorized(Json(UnauthorizedResponse::default()));
        };

        let visions = match get_visions_by_user(&mut tx, &user.id, VISION_LIST_LIMIT).await {
            Ok(val) => val,
            Err(err) => {
                return VisionListResponses::InternalServerError(Json(
                    InternalServerErrorResponse::new(
                        "route.vision",
                        "list_visions_api",
                        "get_visions_by_user",
                        &err.to_string(),
                    ),
                ))
            }
        };

        VisionListResponses::Ok(Json(VisionListResponse {
            ok: true,
            visions: visions
                .into_iter()
                .map(|x| VisionDetail {
                    id: x.id.to_string(),
                    prompt: x.prompt,
                    public_id: x.image,
                    meta: x.meta.0,
                    created_at: datetime_to_string(x.created_at),
                })
                .collect(),
        }))
    }
}
