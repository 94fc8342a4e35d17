use chrono::Utc;
use redis::ConnectionLike;
use serde::{Deserialize, Serialize};

use crate::{model::user::User, settings::Config};

const SESSION_PREFIX: &str = "psi:session:";

fn session_key(token: &str) -> String {
    format!("{}{}", SESSION_PREFIX, token)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub refresh_token: String,
    pub created_at: i64,
}

/// Stores the session under the access token for the token's lifetime.
pub fn add_session<C: ConnectionLike>(
    redis_conn: &mut C,
    user: &User,
    config: &Config,
    token: &str,
    refresh_token: &str,
) -> anyhow::Result<()> {
    let session_data = SessionData {
        user_id: user.id.to_string(),
        refresh_token: refresh_token.to_string(),
        created_at: Utc::now().timestamp(),
    };
    let session_json = serde_json::to_string(&session_data)?;
    let ttl_seconds = config.jwt_exp as u64 * 60;
    redis::Cmd::set_ex(session_key(token), session_json, ttl_seconds).exec(redis_conn)?;
    Ok(())
}

pub fn get_session<C: ConnectionLike>(
    redis_conn: &mut C,
    token: String,
) -> anyhow::Result<Option<SessionData>> {
    let res: Option<String> = redis::cmd("GET").arg(session_key(&token)).query(redis_conn)?;
    match res {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Returns false when there was no session to remove.
pub fn remove_session<C: ConnectionLike>(redis_conn: &mut C, token: &str) -> anyhow::Result<bool> {
    let removed: i64 = redis::cmd("DEL").arg(session_key(token)).query(redis_conn)?;
    Ok(removed > 0)
}
