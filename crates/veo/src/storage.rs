//! Remote object storage for generated videos.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use showreel_core::error::CoreError;

use crate::api::REQUEST_TIMEOUT;
use crate::auth::CredentialProvider;

/// Copies a remote object to a local path.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn copy(&self, remote_uri: &str, local_path: &Path) -> Result<(), CoreError>;
}

/// Split `gs://bucket/path/to/object` into bucket and object name.
pub fn parse_gs_uri(uri: &str) -> Result<(&str, &str), CoreError> {
    let rest = uri
        .strip_prefix("gs://")
        .ok_or_else(|| CoreError::Validation(format!("unsupported storage URI '{uri}'")))?;
    match rest.split_once('/') {
        Some((bucket, object)) if !bucket.is_empty() && !object.is_empty() => Ok((bucket, object)),
        _ => Err(CoreError::Validation(format!(
            "storage URI '{uri}' has no object name"
        ))),
    }
}

/// Cloud Storage download through the JSON API (`alt=media`).
pub struct GcsObjectStore {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl GcsObjectStore {
    /// Store talking to the public Cloud Storage endpoint.
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT * 5)
            .build()
            .unwrap_or_default();
        Self::with_client(client, "https://storage.googleapis.com", credentials)
    }

    /// Store with a caller-supplied client and endpoint (emulators, tests).
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    fn media_url(&self, bucket: &str, object: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}?alt=media",
            self.base_url,
            urlencoding::encode(bucket),
            urlencoding::encode(object)
        )
    }
}

#[async_trait]
impl ObjectStore for GcsObjectStore {
    async fn copy(&self, remote_uri: &str, local_path: &Path) -> Result<(), CoreError> {
        let (bucket, object) = parse_gs_uri(remote_uri)?;
        let token = self.credentials.token().await?;

        let response = self
            .client
            .get(self.media_url(bucket, object))
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| CoreError::Transport(format!("download of {remote_uri} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = format!("download of {remote_uri} returned {status}: {body}");
            return Err(if status.as_u16() == 401 || status.as_u16() == 403 {
                CoreError::Auth(message)
            } else {
                CoreError::Transport(message)
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CoreError::Transport(format!("download of {remote_uri} failed: {e}")))?;
        tokio::fs::write(local_path, &bytes).await?;

        tracing::debug!(
            remote = remote_uri,
            local = %local_path.display(),
            bytes = bytes.len(),
            "Copied remote artifact",
        );
        Ok(())
    }
}
