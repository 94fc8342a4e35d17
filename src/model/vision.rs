use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

pub const TABLE_NAME: &str = "public.vision";

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct Vision {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prompt: String,
    /// public id of the stored image at the hosting provider
    pub image: String,
    pub meta: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
