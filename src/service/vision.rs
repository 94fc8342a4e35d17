//! Image generation flow: validate, generate, upload, report.

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    client::{ImageGeneration, ImageGenerationRequest, ImageStorage, UploadOptions, UploadSource},
    core::error::ServiceError,
};

pub const ALLOWED_SIZES: &[&str] = &["1024x1024", "1024x1536", "1536x1024", "auto"];
pub const ALLOWED_BACKGROUNDS: &[&str] = &["transparent", "white"];
pub const DEFAULT_SIZE: &str = "1024x1024";
pub const UPLOAD_FOLDER: &str = "psi-vision";
// png keeps transparent backgrounds
pub const UPLOAD_FORMAT: &str = "png";

/// A validated generation request.
#[derive(Clone, Debug, PartialEq)]
pub struct VisionRequest {
    pub prompt: String,
    pub size: String,
    pub background: Option<String>,
}

impl VisionRequest {
    pub fn parse(
        prompt: Option<&str>,
        size: Option<&str>,
        background: Option<&str>,
    ) -> Result<Self, ServiceError> {
        let prompt = prompt.map(str::trim).unwrap_or_default();
        // only a missing or empty size takes the default, blank is rejected
        let size = size
            .filter(|x| !x.is_empty())
            .unwrap_or(DEFAULT_SIZE)
            .trim()
            .to_lowercase();
        let background = background
            .map(|x| x.trim().to_lowercase())
            .filter(|x| !x.is_empty());

        if prompt.is_empty() {
            return Err(ServiceError::Validation("No vision provided".to_string()));
        }
        if !ALLOWED_SIZES.contains(&size.as_str()) {
            return Err(ServiceError::Validation(format!(
                "Invalid size. Allowed: {}",
                ALLOWED_SIZES.join(", ")
            )));
        }
        if let Some(background) = &background {
            if !ALLOWED_BACKGROUNDS.contains(&background.as_str()) {
                return Err(ServiceError::Validation(format!(
                    "Invalid background. Allowed: null, {}",
                    ALLOWED_BACKGROUNDS.join(", ")
                )));
            }
        }
        Ok(Self {
            prompt: prompt.to_string(),
            size,
            background,
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GeneratedVision {
    pub prompt: String,
    pub image_url: String,
    pub size: String,
    pub background: Option<String>,
    pub public_id: String,
    /// `b64` when the model returned bytes, `url` otherwise
    pub source: &'static str,
}

impl GeneratedVision {
    pub fn meta(&self) -> Value {
        json!({
            "size": self.size,
            "background": self.background,
            "image_url": self.image_url,
            "source": self.source,
        })
    }
}

/// `<unix seconds>-<8 hex chars>`, unique across concurrent requests.
pub fn new_public_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().timestamp(), &suffix[..8])
}

pub async fn generate_vision(
    images: &dyn ImageGeneration,
    storage: &dyn ImageStorage,
    request: &VisionRequest,
) -> Result<GeneratedVision, ServiceError> {
    let image = images
        .generate(&ImageGenerationRequest {
            prompt: request.prompt.clone(),
            size: request.size.clone(),
            background: request.background.clone(),
        })
        .await?;

    let (source, kind) = match (image.b64_json, image.url) {
        (Some(b64), _) => {
            let bytes = STANDARD.decode(b64.trim()).map_err(|err| {
                ServiceError::UpstreamContent(format!(
                    "Model returned undecodable image data: {}",
                    err
                ))
            })?;
            (UploadSource::Bytes(bytes), "b64")
        }
        (None, Some(url)) => (UploadSource::Url(url), "url"),
        (None, None) => {
            return Err(ServiceError::UpstreamContent(
                "No image content returned from model.".to_string(),
            ))
        }
    };

    let options = UploadOptions {
        folder: UPLOAD_FOLDER.to_string(),
        public_id: new_public_id(),
        format: UPLOAD_FORMAT.to_string(),
        overwrite: true,
        invalidate: true,
    };
    let uploaded = storage.upload(source, &options).await?;
    let Some(image_url) = uploaded.secure_url else {
        warn!("image upload for {} returned no url", options.public_id);
        return Err(ServiceError::UpstreamFailure {
            message: "Cloudinary upload failed.".to_string(),
            details: uploaded.raw,
        });
    };
    let public_id = uploaded.public_id.unwrap_or(options.public_id);
    info!("vision {} stored at {}", public_id, image_url);

    Ok(GeneratedVision {
        prompt: request.prompt.clone(),
        image_url,
        size: request.size.clone(),
        background: request.background.clone(),
        public_id,
        source: kind,
    })
}
