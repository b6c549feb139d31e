use async_trait::async_trait;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, Secret};
use service_core::error::AppError;
use service_core::observability::PropagateTraceContext;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError>;
    /// Publicly resolvable URL for an uploaded object.
    fn public_url(&self, key: &str) -> Result<String, AppError>;
}

/// Object storage on the hosted storage REST API.
pub struct SupabaseStorage {
    client: Client,
    base_url: Url,
    bucket: String,
    key: Secret<String>,
}

impl SupabaseStorage {
    pub fn new(base_url: &str, bucket: &str, key: Secret<String>) -> Result<Self, AppError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Invalid storage URL {}: {}", base_url, e))
        })?;
        Ok(Self {
            client: Client::new(),
            base_url,
            bucket: bucket.to_string(),
            key,
        })
    }

    /// `{base}/storage/v1/object/{prefix..}/{bucket}/{key}` with each segment
    /// percent-encoded.
    fn object_url(&self, prefix: &[&str], key: &str) -> Result<Url, AppError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                AppError::ConfigError(anyhow::anyhow!(
                    "Storage URL {} cannot be a base",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(["storage", "v1", "object"])
            .extend(prefix)
            .push(&self.bucket)
            .extend(key.split('/'));
        Ok(url)
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload(&self, key: &str, data: Vec<u8>, content_type: &str) -> Result<(), AppError> {
        let url = self.object_url(&[], key)?;
        let secret = self.key.expose_secret();
        let size = data.len();

        let response = self
            .client
            .post(url)
            .header("apikey", secret)
            .bearer_auth(secret)
            .header("Content-Type", content_type)
            .body(data)
            .with_trace_context()
            .send()
            .await
            .map_err(|e| {
                tracing::error!(key = %key, error = %e, "Storage upload request failed");
                AppError::upstream(format!("Failed to upload PDF: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(key = %key, status = %status, body = %body, "Storage rejected upload");
            return Err(AppError::upstream(format!(
                "Failed to upload PDF: storage returned {}: {}",
                status, body
            )));
        }

        tracing::info!(bucket = %self.bucket, key = %key, size = size, "Uploaded object");
        Ok(())
    }

    fn public_url(&self, key: &str) -> Result<String, AppError> {
        Ok(self.object_url(&["public"], key)?.to_string())
    }
}
