use chrono::{DateTime, Utc};
use fake::{faker::internet::en::SafeEmail, Dummy, Fake, Faker};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::model::user::User;

pub struct UserFactory<T: Clone> {
    modifier_one: fn(x: &User, ext: T) -> User,
    modifier_many: fn(x: &User, idx: usize, ext: T) -> User,
}

impl<T: Clone> Default for UserFactory<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> UserFactory<T> {
    pub fn new() -> Self {
        Self {
            modifier_one: |x, _| x.clone(),
            modifier_many: |x, _, _| x.clone(),
        }
    }

    pub fn modified_one(&mut self, modifier: fn(x: &User, ext: T) -> User) {
        self.modifier_one = modifier
    }

    pub fn modified_many(&mut self, modifier: fn(x: &User, idx: usize, ext: T) -> User) {
        self.modifier_many = modifier
    }

    pub async fn generate_one(&mut self, db: &PgPool, ext: T) -> anyhow::Result<User> {
        let data = (self.modifier_one)(&UserDummy::generate_one(), ext);
        let mut tx = db.begin().await?;
        insert_user(&mut tx, &data).await?;
        tx.commit().await?;
        Ok(data)
    }

    pub async fn generate_many(
        &mut self,
        db: &PgPool,
        num: u32,
        ext: T,
    ) -> anyhow::Result<Vec<User>> {
        let result: Vec<User> = UserDummy::generate_many(num)
            .iter()
            .enumerate()
            .map(|(idx, item)| (self.modifier_many)(item, idx, ext.clone()))
            .collect();
        let mut tx = db.begin().await?;
        for item in result.iter() {
            insert_user(&mut tx, item).await?;
        }
        tx.commit().await?;
        Ok(result)
    }
}

async fn insert_user(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    data: &User,
) -> anyhow::Result<()> {
    crate::repository::user::create_user(tx, data).await
}

#[derive(Debug, Deserialize, Dummy, Clone)]
struct UserDummy {
    pub id: Uuid,
    pub user_name: String,
    #[dummy(faker = "SafeEmail()")]
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_date: DateTime<Utc>,
}

impl UserDummy {
    fn into_user(self) -> User {
        User {
            id: self.id,
            user_name: self.user_name,
            email: Some(self.email),
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            is_active: true,
            is_staff: false,
            last_login: None,
            created_date: Some(self.created_date),
            updated_date: Some(self.created_date),
        }
    }

    pub fn generate_one() -> User {
        Faker.fake::<UserDummy>().into_user()
    }

    pub fn generate_many(num: u32) -> Vec<User> {
        (0..num)
            .map(|_| Faker.fake::<UserDummy>().into_user())
            .collect()
    }
}
