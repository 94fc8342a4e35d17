use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::model::profile::{Profile, TABLE_NAME};

/// Returns the user's profile, creating an empty one on first access.
///
/// The insert relies on the unique `user_id` constraint, so concurrent first
/// requests for the same user still end up with a single row.
pub async fn get_or_create_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &Uuid,
) -> anyhow::Result<(Profile, bool)> {
    let inserted = sqlx::query(
        format!(
            r#"INSERT INTO {} (id, user_id, style_keywords, consent_use_demographics, onboarded, updated_at)
            VALUES ($1, $2, '', FALSE, FALSE, NOW())
            ON CONFLICT (user_id) DO NOTHING"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(Uuid::now_v7())
    .bind(user_id)
    .execute(&mut **tx)
    .await?
    .rows_affected()
        > 0;

    let profile: Profile =
        sqlx::query_as(format!("SELECT * FROM {} WHERE user_id = $1", TABLE_NAME).as_str())
            .bind(user_id)
            .fetch_one(&mut **tx)
            .await?;
    Ok((profile, inserted))
}

pub async fn update_profile(
    tx: &mut Transaction<'_, Postgres>,
    profile: &mut Profile,
    now: &DateTime<Utc>,
) -> anyhow::Result<()> {
    profile.updated_at = *now;
    sqlx::query(
        format!(
            r#"UPDATE {}
            SET age_group = $1, gender = $2, region = $3, style_keywords = $4,
            consent_use_demographics = $5, onboarded = $6, updated_at = $7
            WHERE id = $8"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&profile.age_group)
    .bind(&profile.gender)
    .bind(&profile.region)
    .bind(&profile.style_keywords)
    .bind(profile.consent_use_demographics)
    .bind(profile.onboarded)
    .bind(now)
    .bind(profile.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn get_profiles_by_user_ids(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[Uuid],
) -> anyhow::Result<Vec<Profile>> {
    let profiles: Vec<Profile> = sqlx::query_as(
        format!("SELECT * FROM {} WHERE user_id = ANY($1)", TABLE_NAME).as_str(),
    )
    .bind(user_ids)
    .fetch_all(&mut **tx)
    .await?;
    Ok(profiles)
}
