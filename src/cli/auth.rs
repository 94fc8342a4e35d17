use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    core::security::{generate_temp_password, hash_password},
    model::{
        profile::{AGE_GROUPS, GENDERS, REGIONS},
        user::User,
    },
    repository,
};

const TEMP_PASSWORD_LEN: usize = 12;

#[derive(Debug, Default)]
pub struct NewAttendee {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub age_group: Option<String>,
    pub gender: Option<String>,
    pub region: Option<String>,
    pub staff: bool,
}

fn checked_choice(
    name: &str,
    value: &Option<String>,
    allowed: &[&str],
) -> anyhow::Result<Option<String>> {
    match value.as_deref().map(str::trim).filter(|x| !x.is_empty()) {
        Some(v) if !allowed.contains(&v) => {
            anyhow::bail!("invalid {} '{}', expected one of: {}", name, v, allowed.join(", "))
        }
        v => Ok(v.map(str::to_string)),
    }
}

/// Creates an account with a not-yet-onboarded profile in one transaction.
/// Returns the user and the password it was created with.
pub async fn create_attendee(pool: &PgPool, attendee: &NewAttendee) -> anyhow::Result<(User, String)> {
    let age_group = checked_choice("age group", &attendee.age_group, AGE_GROUPS)?;
    let gender = checked_choice("gender", &attendee.gender, GENDERS)?;
    let region = checked_choice("region", &attendee.region, REGIONS)?;
    let password = attendee
        .password
        .clone()
        .unwrap_or_else(|| generate_temp_password(TEMP_PASSWORD_LEN));

    let mut tx = pool.begin().await?;
    if repository::user::get_user_by_username(&mut tx, &attendee.username)
        .await?
        .is_some()
    {
        anyhow::bail!("user {} already exists", attendee.username);
    }

    let hashed_password =
        hash_password(&password).map_err(|err| anyhow::anyhow!("hash password: {}", err))?;
    let now = Utc::now();
    let user = User {
        id: Uuid::now_v7(),
        user_name: attendee.username.clone(),
        email: Some(attendee.email.trim().to_string()),
        password: hashed_password,
        first_name: None,
        last_name: None,
        is_active: true,
        is_staff: attendee.staff,
        last_login: None,
        created_date: Some(now),
        updated_date: Some(now),
    };
    repository::user::create_user(&mut tx, &user).await?;

    let (mut profile, _) = repository::profile::get_or_create_profile(&mut tx, &user.id).await?;
    profile.age_group = age_group;
    profile.gender = gender;
    profile.region = region;
    profile.onboarded = false;
    repository::profile::update_profile(&mut tx, &mut profile, &now).await?;

    tx.commit().await?;
    Ok((user, password))
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use super::*;
    use crate::core::security::verify_hash_password;

    #[sqlx::test]
    async fn test_create_attendee(pool: PgPool) -> anyhow::Result<()> {
        // When
        let attendee = NewAttendee {
            username: "fox".to_string(),
            email: "fox@example.com".to_string(),
            age_group: Some("20s".to_string()),
            region: Some("se_asia".to_string()),
            ..Default::default()
        };
        let (user, password) = create_attendee(&pool, &attendee).await?;

        // Expect
        assert_eq!(password.len(), TEMP_PASSWORD_LEN);
        assert!(verify_hash_password(&password, &user.password).unwrap());
        let db_res: Option<(String, Option<String>, Option<String>, bool)> = sqlx::query_as(
            r#"
            SELECT u.user_name, p.age_group, p.region, p.onboarded
            FROM public.user u JOIN public.profile p ON p.user_id = u.id
            WHERE u.user_name = $1
            "#,
        )
        .bind("fox")
        .fetch_optional(&pool)
        .await?;
        assert_eq!(
            db_res,
            Some((
                "fox".to_string(),
                Some("20s".to_string()),
                Some("se_asia".to_string()),
                false
            ))
        );

        // When the same user name is used again
        let again = create_attendee(&pool, &attendee).await;

        // Expect
        assert!(again.is_err());
        Ok(())
    }

    #[sqlx::test]
    async fn test_create_attendee_rejects_unknown_choice(pool: PgPool) -> anyhow::Result<()> {
        // When
        let attendee = NewAttendee {
            username: "owl".to_string(),
            email: "owl@example.com".to_string(),
            password: Some("given-password".to_string()),
            gender: Some("robot".to_string()),
            ..Default::default()
        };
        let res = create_attendee(&pool, &attendee).await;

        // Expect nothing was written
        assert!(res.is_err());
        let count: (i64,) = sqlx::query_as("SELECT count(id) FROM public.user")
            .fetch_one(&pool)
            .await?;
        assert_eq!(count.0, 0);
        Ok(())
    }
}
