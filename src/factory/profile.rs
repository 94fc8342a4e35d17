use chrono::Utc;
use fake::{Dummy, Fake, Faker};
use rand::seq::SliceRandom;
use sqlx::PgPool;
use uuid::Uuid;

use crate::model::profile::{Profile, AGE_GROUPS, GENDERS, REGIONS, TABLE_NAME};

/// Builds profiles for existing users. `ext` is the owning user id.
pub struct ProfileFactory {
    modifier_one: fn(x: &Profile, user_id: Uuid) -> Profile,
}

impl Default for ProfileFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfileFactory {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &Profile, user_id: Uuid) -> Profile) {
        self.modifier_one = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, user_id: Uuid) -> anyhow::Result<Profile> {
        let data = ProfileDummy::generate_one(user_id);
        let data = (self.modifier_one)(&data, user_id);
        sqlx::query(
            format!(
                r#"INSERT INTO {} (id, user_id, age_group, gender, region, style_keywords,
                consent_use_demographics, onboarded, updated_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"#,
                TABLE_NAME
            )
            .as_str(),
        )
        .bind(data.id)
        .bind(data.user_id)
        .bind(&data.age_group)
        .bind(&data.gender)
        .bind(&data.region)
        .bind(&data.style_keywords)
        .bind(data.consent_use_demographics)
        .bind(data.onboarded)
        .bind(data.updated_at)
        .execute(db)
        .await?;
        Ok(data)
    }
}

#[derive(Debug, Dummy, Clone)]
struct ProfileDummy {
    pub id: Uuid,
    pub consent_use_demographics: bool,
    pub onboarded: bool,
}

impl ProfileDummy {
    fn generate_one(user_id: Uuid) -> Profile {
        let dummy = Faker.fake::<ProfileDummy>();
        let mut rng = rand::thread_rng();
        let pick = |choices: &[&str], rng: &mut rand::rngs::ThreadRng| {
            choices.choose(rng).map(|x| x.to_string())
        };
        Profile {
            id: dummy.id,
            user_id,
            age_group: pick(AGE_GROUPS, &mut rng),
            gender: pick(GENDERS, &mut rng),
            region: pick(REGIONS, &mut rng),
            style_keywords: "minimalist, cinematic".to_string(),
            consent_use_demographics: dummy.consent_use_demographics,
            onboarded: dummy.onboarded,
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        factory::{profile::ProfileFactory, user::UserFactory},
        model::profile::Profile,
    };

    #[sqlx::test]
    async fn test_generate_one_modified(pool: PgPool) -> anyhow::Result<()> {
        // Given
        let user = UserFactory::<()>::new().generate_one(&pool, ()).await?;

        // When
        let mut factory = ProfileFactory::new();
        factory.modified_one(|data, _| Profile {
            onboarded: true,
            ..data.clone()
        });
        let profile = factory.generate_one(&pool, user.id).await?;

        // Expect
        let res: (bool,) = sqlx::query_as("SELECT onboarded FROM public.profile WHERE id = $1")
            .bind(profile.id)
            .fetch_one(&pool)
            .await?;
        assert!(res.0);
        Ok(())
    }
}
