use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::{
    core::{error::ServiceError, utils::truncate_chars},
    settings::Config,
};

use super::{body_to_value, ChatCompletion, GeneratedImage, ImageGeneration, ImageGenerationRequest};

pub const CHAT_MODEL: &str = "gpt-4o-mini";
pub const IMAGE_MODEL: &str = "gpt-image-1";

const CHAT_TIMEOUT: Duration = Duration::from_secs(60);
const IMAGE_TIMEOUT: Duration = Duration::from_secs(180);

/// OpenAI-compatible client for chat completions and image generation.
pub struct OpenAiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    organization: Option<String>,
    project: Option<String>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.openai_base_url.clone(),
            api_key: config.openai_api_key.clone(),
            organization: config.openai_org_id.clone(),
            project: config.openai_project_id.clone(),
        }
    }

    fn post(&self, path: &str) -> Result<RequestBuilder, ServiceError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ServiceError::Configuration("Missing OPENAI_API_KEY.".to_string())
        })?;
        let mut req = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(api_key);
        if let Some(org) = &self.organization {
            req = req.header("OpenAI-Organization", org);
        }
        if let Some(project) = &self.project {
            req = req.header("OpenAI-Project", project);
        }
        Ok(req)
    }

    async fn send_json(
        &self,
        path: &str,
        body: &Value,
        timeout: Duration,
    ) -> Result<Value, ServiceError> {
        debug!("OpenAI request to {}{}", self.base_url, path);
        let response = self.post(path)?.json(body).timeout(timeout).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!("OpenAI API error {}: {}", status, truncate_chars(&text, 500));
            return Err(ServiceError::UpstreamFailure {
                message: format!(
                    "OpenAI API returned {}: {}",
                    status,
                    truncate_chars(&text, 300)
                ),
                details: body_to_value(&text),
            });
        }
        serde_json::from_str(&text).map_err(|err| {
            ServiceError::UpstreamContent(format!("Failed to parse OpenAI response: {}", err))
        })
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(
        &self,
        system_prompt: &str,
        message: &str,
        max_tokens: u32,
    ) -> Result<String, ServiceError> {
        let body = json!({
            "model": CHAT_MODEL,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": message },
            ],
            "max_tokens": max_tokens,
        });
        let json = self.send_json("/chat/completions", &body, CHAT_TIMEOUT).await?;
        let reply = json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| {
                ServiceError::UpstreamContent("No reply returned from model.".to_string())
            })?;
        info!("chat reply received ({} chars)", reply.len());
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl ImageGeneration for OpenAiClient {
    async fn generate(
        &self,
        request: &ImageGenerationRequest,
    ) -> Result<GeneratedImage, ServiceError> {
        let mut body = json!({
            "model": IMAGE_MODEL,
            "prompt": request.prompt,
            "size": request.size,
            "n": 1,
        });
        if let Some(background) = &request.background {
            body["background"] = json!(background);
        }
        let json = self
            .send_json("/images/generations", &body, IMAGE_TIMEOUT)
            .await?;
        Ok(first_image(&json))
    }
}

/// Reads `data[0]` of an images response; empty strings count as missing.
pub fn first_image(json: &Value) -> GeneratedImage {
    let item = &json["data"][0];
    let field = |name: &str| {
        item.get(name)
            .and_then(|v| v.as_str())
            .filter(|v| !v.is_empty())
            .map(|v| v.to_string())
    };
    GeneratedImage {
        url: field("url"),
        b64_json: field("b64_json"),
    }
}
