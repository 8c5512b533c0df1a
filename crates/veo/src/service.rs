//! The video service seam used by the pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use showreel_core::error::CoreError;
use showreel_core::job::{Job, JobHandle};
use showreel_core::media::validate_media_type;
use showreel_core::prompt::GenerationRequest;

use crate::api::VeoApi;
use crate::auth::CredentialProvider;
use crate::messages::{model_from_operation, OperationStatus, PredictRequest};

/// Asynchronous video generation service.
///
/// `submit` starts exactly one job and never retries. `poll` performs a
/// single status check; waiting is [`crate::poller::JobPoller`]'s job.
#[async_trait]
pub trait VideoService: Send + Sync {
    async fn submit(&self, request: &GenerationRequest) -> Result<Job, CoreError>;

    async fn poll(&self, handle: &JobHandle) -> Result<OperationStatus, CoreError>;
}

/// [`VideoService`] backed by the Vertex AI REST API.
pub struct VeoClient {
    api: VeoApi,
    credentials: Arc<dyn CredentialProvider>,
    /// Model used for polls whose operation name does not carry one.
    default_model: String,
}

impl VeoClient {
    /// Create a client. `default_model` is only used to poll operations
    /// whose name does not embed a model id.
    pub fn new(api: VeoApi, credentials: Arc<dyn CredentialProvider>, default_model: &str) -> Self {
        Self {
            api,
            credentials,
            default_model: default_model.to_string(),
        }
    }
}

#[async_trait]
impl VideoService for VeoClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Job, CoreError> {
        validate_media_type(request.media_type())?;

        let token = self.credentials.token().await?;
        let model = request.config().model.id();
        let body = PredictRequest::from_request(request);
        let submitted = self.api.predict_long_running(model, &body, &token).await?;

        if submitted.name.trim().is_empty() {
            return Err(CoreError::Transport(
                "service returned an empty operation name".into(),
            ));
        }

        tracing::info!(
            source = %request.source().display(),
            scenario_id = %request.scenario().id,
            model,
            operation = %submitted.name,
            "Submitted generation job",
        );
        Ok(Job::submitted(JobHandle::new(submitted.name)))
    }

    async fn poll(&self, handle: &JobHandle) -> Result<OperationStatus, CoreError> {
        let token = self.credentials.token().await?;
        let model = model_from_operation(handle.as_str()).unwrap_or(self.default_model.as_str());
        let operation = self
            .api
            .fetch_operation(model, handle.as_str(), &token)
            .await?;
        Ok(operation.status())
    }
}
