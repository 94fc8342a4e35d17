use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::core::error::ServiceError;

use super::{Mailer, MailerResponse, OutgoingEmail};

const SEND_TIMEOUT: Duration = Duration::from_secs(20);

/// Transactional email over the Resend HTTP API.
pub struct ResendClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl ResendClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl Mailer for ResendClient {
    async fn send(&self, email: &OutgoingEmail) -> Result<MailerResponse, ServiceError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| ServiceError::Configuration("Missing RESEND_API_KEY.".to_string()))?;
        debug!("sending email to {:?}", email.to);
        let response = self
            .http
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(api_key)
            .json(email)
            .timeout(SEND_TIMEOUT)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(MailerResponse { status, body })
    }
}
