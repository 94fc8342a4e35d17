use std::{collections::BTreeMap, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use sha1::{Digest, Sha1};
use tracing::{info, warn};

use crate::{core::error::ServiceError, settings::CloudinaryCredentials};

use super::{body_to_value, ImageStorage, UploadOptions, UploadResult, UploadSource};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

/// Signed uploads to the Cloudinary image upload API.
pub struct CloudinaryClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<CloudinaryCredentials>,
}

impl CloudinaryClient {
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        credentials: Option<CloudinaryCredentials>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

/// Upload parameters that take part in the signature, sorted by name.
pub fn signed_params(options: &UploadOptions, timestamp: i64) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("folder", options.folder.clone()),
        ("format", options.format.clone()),
        ("invalidate", options.invalidate.to_string()),
        ("overwrite", options.overwrite.to_string()),
        ("public_id", options.public_id.clone()),
        ("timestamp", timestamp.to_string()),
    ])
}

/// `sha1("k1=v1&k2=v2" + api_secret)` over the sorted parameters.
pub fn sign(params: &BTreeMap<&'static str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");
    let mut hasher = Sha1::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[async_trait]
impl ImageStorage for CloudinaryClient {
    async fn upload(
        &self,
        source: UploadSource,
        options: &UploadOptions,
    ) -> Result<UploadResult, ServiceError> {
        let creds = self.credentials.as_ref().ok_or_else(|| {
            ServiceError::Configuration(
                "Cloudinary env missing. Provide CLOUDINARY_URL or \
                 CLOUDINARY_CLOUD_NAME / CLOUDINARY_API_KEY / CLOUDINARY_API_SECRET."
                    .to_string(),
            )
        })?;

        let params = signed_params(options, Utc::now().timestamp());
        let signature = sign(&params, &creds.api_secret);
        let mut form = Form::new()
            .text("api_key", creds.api_key.clone())
            .text("signature", signature);
        for (key, val) in params {
            form = form.text(key, val);
        }
        form = match source {
            UploadSource::Bytes(bytes) => form.part(
                "file",
                Part::bytes(bytes)
                    .file_name(format!("{}.{}", options.public_id, options.format)),
            ),
            UploadSource::Url(url) => form.text("file", url),
        };

        let url = format!("{}/v1_1/{}/image/upload", self.base_url, creds.cloud_name);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .timeout(UPLOAD_TIMEOUT)
            .send()
            .await?;
        let status = response.status();
        let raw = body_to_value(&response.text().await?);
        if !status.is_success() {
            warn!("Cloudinary upload returned {}: {}", status, raw);
            return Ok(UploadResult {
                secure_url: None,
                public_id: None,
                raw,
            });
        }
        let field = |name: &str| raw.get(name).and_then(|v| v.as_str()).map(str::to_string);
        let result = UploadResult {
            secure_url: field("secure_url"),
            public_id: field("public_id"),
            raw: raw.clone(),
        };
        info!("uploaded image {:?}", result.public_id);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> UploadOptions {
        UploadOptions {
            folder: "psi-vision".to_string(),
            public_id: "1700000000-abcd1234".to_string(),
            format: "png".to_string(),
            overwrite: true,
            invalidate: true,
        }
    }

    #[test]
    fn test_signed_params_are_sorted() {
        let params = signed_params(&options(), 1_700_000_000);
        let keys: Vec<_> = params.keys().copied().collect();
        assert_eq!(
            keys,
            vec!["folder", "format", "invalidate", "overwrite", "public_id", "timestamp"]
        );
        assert_eq!(params["overwrite"], "true");
    }

    #[test]
    fn test_sign() {
        let params = BTreeMap::from([
            ("public_id", "sample_image".to_string()),
            ("timestamp", "1315060510".to_string()),
        ]);
        // sha1("public_id=sample_image&timestamp=1315060510abcd")
        assert_eq!(
            sign(&params, "abcd"),
            "b4ad47fb4e25c7bf5f92a20089f9db59bc302313"
        );
    }

    #[tokio::test]
    async fn test_upload_without_credentials_is_a_configuration_error() {
        let client = CloudinaryClient::new(reqwest::Client::new(), "http://127.0.0.1:9", None);
        let err = client
            .upload(UploadSource::Url("https://img.example/1.png".to_string()), &options())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
    }
}
