use chrono::{DateTime, Utc};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    core::sqlx_utils::{binds_query_as, query_builder, SqlxBinds},
    model::user::{User, TABLE_NAME},
};

pub async fn get_all_user(
    tx: &mut Transaction<'_, Postgres>,
    page: u32,
    page_size: u32,
    search: Option<String>,
) -> anyhow::Result<(Vec<User>, u32, u32)> {
    let mut binds: Vec<SqlxBinds> = vec![];
    let mut filters: Vec<String> = vec![];

    if let Some(search) = search {
        binds.push(SqlxBinds::String(format!("%{}%", search)));
        filters.push(format!(
            "(user_name ILIKE ${0} OR email ILIKE ${0})",
            binds.len()
        ));
    }

    let page = page.max(1);
    let page_size = page_size.max(1);
    let stmt = query_builder(
        None,
        TABLE_NAME,
        &filters,
        &["created_date DESC", "user_name ASC"],
        Some(page_size),
        Some((page - 1) * page_size),
    );
    let stmt_count = query_builder(Some("count(id)"), TABLE_NAME, &filters, &[], None, None);

    let data = binds_query_as::<User>(&stmt, binds.clone())
        .fetch_all(&mut **tx)
        .await?;
    let count = binds_query_as::<(i64,)>(&stmt_count, binds)
        .fetch_one(&mut **tx)
        .await?;
    let num_page = (count.0 as u32).div_ceil(page_size);
    Ok((data, count.0 as u32, num_page))
}

pub async fn get_user_by_id(
    tx: &mut Transaction<'_, Postgres>,
    id: &Uuid,
) -> anyhow::Result<Option<User>> {
    let stmt = query_builder(None, TABLE_NAME, &["id = $1".to_string()], &[], None, None);
    let user = binds_query_as::<User>(&stmt, vec![SqlxBinds::Uuid(*id)])
        .fetch_optional(&mut **tx)
        .await?;
    Ok(user)
}

/// Users matching `ids`, ordered by user name. Unknown ids are ignored.
pub async fn get_users_by_ids(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> anyhow::Result<Vec<User>> {
    let users: Vec<User> = sqlx::query_as(
        format!(
            "SELECT * FROM {} WHERE id = ANY($1) ORDER BY user_name ASC",
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(ids)
    .fetch_all(&mut **tx)
    .await?;
    Ok(users)
}

pub async fn get_user_by_username(
    tx: &mut Transaction<'_, Postgres>,
    username: &str,
) -> anyhow::Result<Option<User>> {
    let user: Option<User> = sqlx::query_as(
        format!("SELECT * FROM {} WHERE user_name = $1", TABLE_NAME).as_str(),
    )
    .bind(username)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(user)
}

/// Case-insensitive email lookup. Oldest account first when an address is
/// shared by several users.
pub async fn get_users_by_email(
    tx: &mut Transaction<'_, Postgres>,
    email: &str,
) -> anyhow::Result<Vec<User>> {
    let users: Vec<User> = sqlx::query_as(
        format!(
            "SELECT * FROM {} WHERE LOWER(email) = LOWER($1) ORDER BY created_date ASC",
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(email)
    .fetch_all(&mut **tx)
    .await?;
    Ok(users)
}

pub async fn create_user(tx: &mut Transaction<'_, Postgres>, user: &User) -> anyhow::Result<()> {
    sqlx::query(
        format!(r#"
        INSERT INTO {} (id, user_name, email, password, first_name, last_name, is_active, is_staff, last_login, created_date, updated_date)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#, TABLE_NAME).as_str(),
    )
    .bind(user.id)
    .bind(&user.user_name)
    .bind(&user.email)
    .bind(&user.password)
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(user.is_active)
    .bind(user.is_staff)
    .bind(user.last_login)
    .bind(user.created_date)
    .bind(user.updated_date)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn update_password(
    tx: &mut Transaction<'_, Postgres>,
    user: &mut User,
    password_hash: String,
    now: &DateTime<Utc>,
) -> anyhow::Result<()> {
    user.password = password_hash;
    user.updated_date = Some(*now);
    sqlx::query(
        format!(
            "UPDATE {} SET password = $1, updated_date = $2 WHERE id = $3",
            TABLE_NAME
        )
        .as_str(),
    )
    .bind(&user.password)
    .bind(now)
    .bind(user.id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

pub async fn update_last_login(
    tx: &mut Transaction<'_, Postgres>,
    user: &mut User,
    now: &DateTime<Utc>,
) -> anyhow::Result<()> {
    user.last_login = Some(*now);
    sqlx::query(format!("UPDATE {} SET last_login = $1 WHERE id = $2", TABLE_NAME).as_str())
        .bind(now)
        .bind(user.id)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
