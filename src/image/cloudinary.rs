//! Cloudinary upload API client.
//!
//! Requests are signed with the account's API secret:
//!
//! ```text
//! signature = hex(SHA-256("{sorted params joined by &}{api_secret}"))
//! ```
//!
//! `file` and `api_key` are sent but not signed. The `public_id` returned by an
//! upload is the deletion handle.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::ImageHostError;

use super::{ImageHost, UploadedImage};

/// Public Cloudinary API endpoint.
pub const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Per-request timeout for upload and destroy calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Account credentials.
#[derive(Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// API base URL, normally [`CLOUDINARY_API_BASE`]
    pub api_base: String,
}

impl CloudinaryConfig {
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            api_base: CLOUDINARY_API_BASE.to_string(),
        }
    }

    /// Point at a different API base (e.g. a local stand-in).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// [`ImageHost`] backed by Cloudinary.
#[derive(Clone)]
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Result<Self, ImageHostError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ImageHostError::Connection(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/{}/image/{}",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name,
            action
        )
    }

    /// Build the signed form for an API call.
    fn signed_form(
        &self,
        params: Vec<(&'static str, String)>,
        timestamp: i64,
    ) -> Vec<(&'static str, String)> {
        let mut signed = params;
        signed.push(("timestamp", timestamp.to_string()));

        let signature = sign_params(&signed, &self.config.api_secret);

        signed.push(("api_key", self.config.api_key.clone()));
        signed.push(("signature", signature));
        signed.push(("signature_algorithm", "sha256".to_string()));
        signed
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        action: &str,
        form: &[(&'static str, String)],
    ) -> Result<T, ImageHostError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .form(form)
            .send()
            .await
            .map_err(|e| ImageHostError::Connection(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ImageHostError::Connection(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .map(|env| env.error.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| ImageHostError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, payload: &str) -> Result<UploadedImage, ImageHostError> {
        let mut form = self.signed_form(Vec::new(), Utc::now().timestamp());
        form.push(("file", payload.to_string()));

        let uploaded: UploadResponse = self.post("upload", &form).await?;
        debug!(public_id = %uploaded.public_id, "Uploaded image");

        Ok(UploadedImage {
            url: uploaded.secure_url,
            delete_handle: uploaded.public_id,
        })
    }

    async fn destroy(&self, delete_handle: &str) -> Result<(), ImageHostError> {
        let form = self.signed_form(
            vec![("public_id", delete_handle.to_string())],
            Utc::now().timestamp(),
        );

        let destroyed: DestroyResponse = self.post("destroy", &form).await?;
        match destroyed.result.as_str() {
            "ok" => Ok(()),
            "not found" => Err(ImageHostError::NotFound(delete_handle.to_string())),
            other => Err(ImageHostError::InvalidResponse(format!(
                "unexpected destroy result: {}",
                other
            ))),
        }
    }
}

/// Compute the request signature over `params`.
fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(&b.0));

    let to_sign = sorted
        .into_iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}
