//! Outbound provider clients.
//!
//! Each provider sits behind a trait so routes and services receive an
//! explicitly constructed instance through [`Providers`], and tests can swap
//! in stubs.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::{core::error::ServiceError, settings::Config};

pub mod cloudinary;
pub mod openai;
pub mod resend;

#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Sends one user message under `system_prompt` and returns the reply.
    async fn complete(
        &self,
        system_prompt: &str,
        message: &str,
        max_tokens: u32,
    ) -> Result<String, ServiceError>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImageGenerationRequest {
    pub prompt: String,
    pub size: String,
    pub background: Option<String>,
}

/// First item of a generation result. Either field may be missing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GeneratedImage {
    pub url: Option<String>,
    pub b64_json: Option<String>,
}

#[async_trait]
pub trait ImageGeneration: Send + Sync {
    async fn generate(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GeneratedImage, ServiceError>;
}

#[derive(Clone, Debug, PartialEq)]
pub enum UploadSource {
    Bytes(Vec<u8>),
    Url(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct UploadOptions {
    pub folder: String,
    pub public_id: String,
    pub format: String,
    pub overwrite: bool,
    pub invalidate: bool,
}

#[derive(Clone, Debug, Default)]
pub struct UploadResult {
    pub secure_url: Option<String>,
    pub public_id: Option<String>,
    /// Provider answer as received, kept for diagnostics.
    pub raw: Value,
}

#[async_trait]
pub trait ImageStorage: Send + Sync {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<UploadResult, ServiceError>;
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OutgoingEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MailerResponse {
    pub status: u16,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    /// Any HTTP answer is returned as-is; only network failures are errors.
    async fn send(&self, email: &OutgoingEmail) -> Result<MailerResponse, ServiceError>;
}

#[derive(Clone)]
pub struct Providers {
    pub chat: Arc<dyn ChatCompletion>,
    pub images: Arc<dyn ImageGeneration>,
    pub storage: Arc<dyn ImageStorage>,
    pub mailer: Arc<dyn Mailer>,
}

impl Providers {
    /// Builds the real HTTP clients. They share one connection pool.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("psi-vision/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let openai = Arc::new(openai::OpenAiClient::new(http.clone(), config));
        let storage = cloudinary::CloudinaryClient::new(
            http.clone(),
            &config.cloudinary_base_url,
            config.cloudinary_credentials()?,
        );
        let mailer = resend::ResendClient::new(
            http,
            &config.resend_base_url,
            config.resend_api_key.clone(),
        );
        Ok(Self {
            chat: openai.clone(),
            images: openai,
            storage: Arc::new(storage),
            mailer: Arc::new(mailer),
        })
    }
}

/// Parses a provider body as JSON, keeping non-JSON bodies as a string.
pub(crate) fn body_to_value(body: &str) -> Value {
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}
