use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::model::vision::{Vision, TABLE_NAME};

pub async fn create_vision(tx: &mut Transaction<'_, Postgres>, vision: &Vision) -> anyhow::Result<()> {
    sqlx::query(
        format!(
            r#"INSERT INTO {} (id, user_id, prompt, image, meta, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)"#,
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(vision.id)
    .bind(vision.user_id)
    .bind(&vision.prompt)
    .bind(&vision.image)
    .bind(&vision.meta)
    .bind(vision.created_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Newest first.
pub async fn get_visions_by_user(
    tx: &mut Transaction<'_, Postgres>,
    user_id: &Uuid,
    limit: u32,
) -> anyhow::Result<Vec<Vision>> {
    let visions: Vec<Vision> = sqlx::query_as(
        format!(
            "SELECT * FROM {} WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(user_id)
    .bind(limit as i64)
    .fetch_all(&mut **tx)
    .await?;
    Ok(visions)
}
