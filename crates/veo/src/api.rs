//! REST API client for the Vertex AI Veo endpoints.
//!
//! Wraps `predictLongRunning` (submission) and `fetchPredictOperation`
//! (status) using [`reqwest`]. Authentication is the caller's concern:
//! every call takes a bearer token.

use std::time::Duration;

use serde::de::DeserializeOwned;
use showreel_core::error::CoreError;

use crate::messages::{FetchOperationRequest, OperationResponse, PredictRequest, SubmitResponse};

/// Per-request timeout. Bounds how far a single poll can overrun the
/// polling budget.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for one project/location.
pub struct VeoApi {
    client: reqwest::Client,
    models_url: String,
}

/// Errors from the Veo REST layer.
#[derive(Debug, thiserror::Error)]
pub enum VeoApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code.
    #[error("Veo API error ({status}): {body}")]
    ApiError { status: u16, body: String },
}

impl From<VeoApiError> for CoreError {
    /// 401/403 are credential problems; every other failure is transport
    /// and may be retried by the poller.
    fn from(err: VeoApiError) -> Self {
        match &err {
            VeoApiError::ApiError { status, .. } if *status == 401 || *status == 403 => {
                CoreError::Auth(err.to_string())
            }
            _ => CoreError::Transport(err.to_string()),
        }
    }
}

impl VeoApi {
    /// Create a client for the public regional endpoint.
    pub fn new(project_id: &str, location: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self::with_client(
            client,
            &format!("https://{location}-aiplatform.googleapis.com/v1"),
            project_id,
            location,
        )
    }

    /// Create a client against an arbitrary base URL (`…/v1`), reusing
    /// an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        project_id: &str,
        location: &str,
    ) -> Self {
        let models_url = format!(
            "{}/projects/{project_id}/locations/{location}/publishers/google/models",
            base_url.trim_end_matches('/')
        );
        Self { client, models_url }
    }

    /// Submit a generation. Returns the operation name.
    pub async fn predict_long_running(
        &self,
        model: &str,
        body: &PredictRequest<'_>,
        token: &str,
    ) -> Result<SubmitResponse, VeoApiError> {
        let response = self
            .client
            .post(format!("{}/{model}:predictLongRunning", self.models_url))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of an operation.
    pub async fn fetch_operation(
        &self,
        model: &str,
        operation_name: &str,
        token: &str,
    ) -> Result<OperationResponse, VeoApiError> {
        let response = self
            .client
            .post(format!("{}/{model}:fetchPredictOperation", self.models_url))
            .bearer_auth(token)
            .json(&FetchOperationRequest { operation_name })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, VeoApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(VeoApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, VeoApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn auth_statuses_map_to_auth_error() {
        for status in [401, 403] {
            let err: CoreError = VeoApiError::ApiError {
                status,
                body: "denied".into(),
            }
            .into();
            assert_matches!(err, CoreError::Auth(_));
        }
    }

    #[test]
    fn other_statuses_are_transient() {
        let err: CoreError = VeoApiError::ApiError {
            status: 503,
            body: "unavailable".into(),
        }
        .into();
        assert!(err.is_transient());
    }
}
