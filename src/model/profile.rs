use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const TABLE_NAME: &str = "public.profile";

pub const AGE_GROUPS: &[&str] = &["teen", "20s", "30s", "40s", "50s", "60plus"];
pub const GENDERS: &[&str] = &["female", "male", "nonbinary", "na"];
pub const REGIONS: &[&str] = &[
    "se_asia",
    "e_asia",
    "s_asia",
    "middle_east",
    "europe",
    "africa",
    "n_america",
    "latam",
    "oceania",
    "na",
];
pub const STYLE_KEYWORDS_MAX_LEN: usize = 200;

#[derive(Clone, Debug, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub region: Option<String>,
    pub style_keywords: String,
    pub consent_use_demographics: bool,
    pub onboarded: bool,
    pub updated_at: DateTime<Utc>,
}
