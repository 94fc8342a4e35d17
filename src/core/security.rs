use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2, PasswordHash, PasswordVerifier,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use poem::Request;
use poem_openapi::{auth::Bearer, SecurityScheme};
use rand::{distributions::Alphanumeric, Rng};
use redis::ConnectionLike;
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{model::user::User, repository::user::get_user_by_id, settings::Config};

use super::session::get_session;

/// password hashing
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);

    // Argon2 with default params (Argon2id v19)
    let argon2 = Argon2::default();

    // Hash password to PHC string ($argon2id$v=19$...)
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// password hash verification
pub fn verify_hash_password(
    password: &str,
    password_hash: &str,
) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(password_hash)?;
    let verify = Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok();
    Ok(verify)
}

/// Short random password handed out by the provisioning command.
pub fn generate_temp_password(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub id: String,
    pub user_name: String,
    pub exp: i64,
}

impl Claims {
    pub fn new(user_id: &str, user_name: &str, config: &Config) -> Self {
        let exp = (Utc::now() + Duration::minutes(config.jwt_exp as i64)).timestamp();

        Self {
            id: user_id.to_string(),
            user_name: user_name.to_string(),
            exp,
        }
    }
}

/// Generate token
pub fn encode_token(claims: &Claims, jwt_secret: &str) -> anyhow::Result<String> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &keys.encoding)?;
    Ok(token)
}

/// Extract payload and Validate token
pub fn decode_token(token: &str, jwt_secret: &str) -> anyhow::Result<Claims> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token_data = decode::<Claims>(token, &keys.decoding, &Validation::default())?;
    Ok(token_data.claims)
}

pub fn generate_token_from_user(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = Claims::new(&user.id.to_string(), &user.user_name, config);
    encode_token(&claims, &config.jwt_secret)
}

/// Resolves the session behind a bearer token. Inactive accounts count as
/// signed out.
pub async fn get_user_from_token<C: ConnectionLike>(
    tx: &mut Transaction<'_, Postgres>,
    redis_conn: &mut C,
    jwt_token: Option<String>,
) -> anyhow::Result<Option<User>> {
    let Some(jwt_token) = jwt_token else {
        return Ok(None);
    };
    let Some(session) = get_session(redis_conn, jwt_token)? else {
        return Ok(None);
    };
    let user_id = Uuid::parse_str(&session.user_id)?;
    let user = get_user_by_id(tx, &user_id).await?;
    Ok(user.filter(|x| x.is_active))
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClaimsRefresh {
    pub id: String,
    pub user_name: String,
    pub exp: i64,
    pub type_key: String,
}

impl ClaimsRefresh {
    pub fn new(user_id: &str, user_name: &str, config: &Config) -> Self {
        let exp = (Utc::now() + Duration::minutes(config.jwt_refresh_exp as i64)).timestamp();

        Self {
            id: user_id.to_string(),
            user_name: user_name.to_string(),
            exp,
            type_key: "refresh".to_string(),
        }
    }
}

/// Generate refresh token
pub fn encode_refresh_token(claims: &ClaimsRefresh, jwt_secret: &str) -> anyhow::Result<String> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &keys.encoding)?;
    Ok(token)
}

/// Extract payload and Validate referesh token
pub fn decode_refresh_token(token: &str, jwt_secret: &str) -> anyhow::Result<ClaimsRefresh> {
    let keys = Keys::new(jwt_secret.as_bytes());
    let token_data = decode::<ClaimsRefresh>(token, &keys.decoding, &Validation::default())?;
    if token_data.claims.type_key != "refresh" {
        anyhow::bail!("not a refresh token");
    }
    Ok(token_data.claims)
}

pub fn generate_refresh_token_from_user(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = ClaimsRefresh::new(&user.id.to_string(), &user.user_name, config);
    encode_refresh_token(&claims, &config.jwt_secret)
}

pub async fn get_user_from_refresh_token(
    tx: &mut Transaction<'_, Postgres>,
    refresh_token: &str,
    config: &Config,
) -> anyhow::Result<Option<User>> {
    let claims = match decode_refresh_token(refresh_token, &config.jwt_secret) {
        Ok(val) => val,
        Err(_) => return Ok(None),
    };
    let user_id = Uuid::parse_str(&claims.id)?;
    let user = get_user_by_id(tx, &user_id).await?;
    Ok(user.filter(|x| x.is_active))
}

/// Claims of a password-set link. `pwd` ties the token to the current
/// password hash so the link dies once the password changes.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ClaimsPasswordReset {
    pub id: String,
    pub pwd: String,
    pub exp: i64,
    pub type_key: String,
}

fn password_fingerprint(user: &User) -> String {
    let hash = user.password.as_str();
    let start = hash.len().saturating_sub(16);
    hash.get(start..).unwrap_or(hash).to_string()
}

pub fn make_password_reset_token(user: &User, config: &Config) -> anyhow::Result<String> {
    let claims = ClaimsPasswordReset {
        id: user.id.to_string(),
        pwd: password_fingerprint(user),
        exp: (Utc::now() + Duration::minutes(config.password_reset_exp as i64)).timestamp(),
        type_key: "password_reset".to_string(),
    };
    let keys = Keys::new(config.jwt_secret.as_bytes());
    let token = encode(&Header::default(), &claims, &keys.encoding)?;
    Ok(token)
}

pub fn check_password_reset_token(user: &User, token: &str, config: &Config) -> bool {
    let keys = Keys::new(config.jwt_secret.as_bytes());
    match decode::<ClaimsPasswordReset>(token, &keys.decoding, &Validation::default()) {
        Ok(data) => {
            data.claims.type_key == "password_reset"
                && data.claims.id == user.id.to_string()
                && data.claims.pwd == password_fingerprint(user)
        }
        Err(_) => false,
    }
}

/// Url-safe base64 of the user id, as used in password-set links.
pub fn encode_uid(id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.to_string())
}

pub fn decode_uid(uidb64: &str) -> Option<Uuid> {
    let raw = URL_SAFE_NO_PAD.decode(uidb64.trim_end_matches('=')).ok()?;
    let raw = String::from_utf8(raw).ok()?;
    Uuid::parse_str(&raw).ok()
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UserApiKey {
    pub token: Option<String>,
}

/// ApiKey authorization
#[derive(SecurityScheme)]
#[oai(ty = "bearer", checker = "bearer_checker")]
pub struct BearerAuthorization(pub UserApiKey);

pub async fn bearer_checker(_req: &Request, api_key: Bearer) -> Option<UserApiKey> {
    Some(UserApiKey {
        token: Some(api_key.token),
    })
}

/// Bearer token of an endpoint where signing in is optional.
pub fn optional_bearer_token(req: &Request) -> Option<String> {
    let header = req.header("authorization")?;
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") || token.trim().is_empty() {
        return None;
    }
    Some(token.trim().to_string())
}
