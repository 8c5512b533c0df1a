//! Typed wire messages for the Veo long-running prediction endpoints.
//!
//! Requests are built from a [`GenerationRequest`]; operation payloads
//! are parsed with [`parse_operation`] and reduced to an
//! [`OperationStatus`] with [`OperationResponse::status`].

use serde::{Deserialize, Serialize};

use showreel_core::artifact::Artifact;
use showreel_core::prompt::GenerationRequest;

// ---------------------------------------------------------------------------
// Submission
// ---------------------------------------------------------------------------

/// Body of `POST …/models/{model}:predictLongRunning`.
#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub instances: Vec<PredictInstance<'a>>,
    pub parameters: PredictParameters<'a>,
}

#[derive(Debug, Serialize)]
pub struct PredictInstance<'a> {
    pub prompt: &'a str,
    pub image: InlineImage<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineImage<'a> {
    pub bytes_base64_encoded: &'a str,
    pub mime_type: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParameters<'a> {
    pub duration_seconds: u32,
    pub aspect_ratio: &'a str,
    pub sample_count: u32,
    pub enhance_prompt: bool,
    pub compression_quality: &'a str,
    pub negative_prompt: &'a str,
    pub person_generation: &'a str,
    pub generate_audio: bool,
    pub resolution: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_uri: Option<&'a str>,
}

impl<'a> PredictRequest<'a> {
    /// Map a composed request onto the wire body.
    pub fn from_request(request: &'a GenerationRequest) -> Self {
        let config = request.config();
        Self {
            instances: vec![PredictInstance {
                prompt: request.prompt(),
                image: InlineImage {
                    bytes_base64_encoded: request.image_base64(),
                    mime_type: request.media_type(),
                },
            }],
            parameters: PredictParameters {
                duration_seconds: config.duration_secs,
                aspect_ratio: config.aspect_ratio.as_str(),
                sample_count: config.sample_count,
                enhance_prompt: config.enhance_prompt,
                compression_quality: config.compression_quality.as_str(),
                negative_prompt: request.negative_prompt(),
                person_generation: &config.person_generation,
                generate_audio: config.generate_audio && config.model.supports_audio(),
                resolution: config.resolution.as_str(),
                seed: config.seed,
                storage_uri: config.storage_uri.as_deref(),
            },
        }
    }
}

/// Response of `predictLongRunning`: the operation name to poll.
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    pub name: String,
}

/// Body of `POST …/models/{model}:fetchPredictOperation`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchOperationRequest<'a> {
    pub operation_name: &'a str,
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A long-running operation as returned by `fetchPredictOperation`.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationResponse {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub response: Option<OperationResult>,
    #[serde(default)]
    pub error: Option<OperationError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResult {
    #[serde(default)]
    pub videos: Vec<VideoEntry>,
    /// Number of samples dropped by the service's safety filters.
    #[serde(default)]
    pub rai_media_filtered_count: Option<u32>,
    #[serde(default)]
    pub rai_media_filtered_reasons: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoEntry {
    #[serde(default)]
    pub gcs_uri: Option<String>,
    #[serde(default)]
    pub bytes_base64_encoded: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
}

/// What a single poll observed.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationStatus {
    /// Not done yet.
    Running,
    /// Done with a result. The list may be empty when every sample was
    /// filtered.
    Succeeded(Vec<Artifact>),
    /// Done with an error payload.
    Failed { code: i64, message: String },
}

impl OperationResponse {
    /// Reduce the raw payload to a status. An `error` wins over `done`,
    /// since some failures arrive before the operation is marked done.
    pub fn status(self) -> OperationStatus {
        if let Some(err) = self.error {
            return OperationStatus::Failed {
                code: err.code,
                message: err.message,
            };
        }
        if !self.done {
            return OperationStatus::Running;
        }
        let artifacts = self
            .response
            .unwrap_or_default()
            .videos
            .into_iter()
            .filter_map(VideoEntry::into_artifact)
            .collect();
        OperationStatus::Succeeded(artifacts)
    }
}

impl VideoEntry {
    /// Remote URI wins over an inline payload. Entries with neither
    /// are dropped.
    fn into_artifact(self) -> Option<Artifact> {
        match (self.gcs_uri, self.bytes_base64_encoded) {
            (Some(uri), _) if !uri.is_empty() => Some(Artifact::remote(uri, self.mime_type)),
            (_, Some(b64)) if !b64.is_empty() => Some(Artifact::inline(b64, self.mime_type)),
            _ => None,
        }
    }
}

/// Parse an operation payload.
pub fn parse_operation(text: &str) -> Result<OperationResponse, serde_json::Error> {
    serde_json::from_str(text)
}

/// Extract the model id from an operation name of the form
/// `projects/…/models/{model}/operations/{id}`.
pub fn model_from_operation(name: &str) -> Option<&str> {
    let (_, rest) = name.split_once("/models/")?;
    let (model, _) = rest.split_once("/operations/")?;
    (!model.is_empty()).then_some(model)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;
    use showreel_core::artifact::ArtifactSource;
    use showreel_core::config::{AspectRatio, GenerationConfig, VeoModel};
    use showreel_core::scenario::Scenario;
    use showreel_core::subject::SubjectKind;

    use super::*;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    #[test]
    fn predict_body_carries_config() {
        let config = GenerationConfig {
            aspect_ratio: AspectRatio::Portrait,
            duration_secs: 6,
            seed: Some(42),
            ..Default::default()
        };
        let request = GenerationRequest::compose(
            Path::new("sofa.png"),
            PNG_MAGIC,
            Scenario::custom("Slow pan"),
            SubjectKind::Sofa,
            &config,
        );
        let body = serde_json::to_value(PredictRequest::from_request(&request)).unwrap();

        let params = &body["parameters"];
        assert_eq!(params["durationSeconds"], 6);
        assert_eq!(params["aspectRatio"], "9:16");
        assert_eq!(params["resolution"], "1080p");
        assert_eq!(params["seed"], 42);
        assert_eq!(params["generateAudio"], true);
        assert!(params.get("storageUri").is_none());
        assert_eq!(body["instances"][0]["image"]["mimeType"], "image/png");
        assert_eq!(body["instances"][0]["prompt"], request.prompt());
    }

    #[test]
    fn audio_disabled_for_models_without_audio() {
        let config = GenerationConfig {
            model: VeoModel::Veo2,
            ..Default::default()
        };
        let request = GenerationRequest::compose(
            Path::new("a.png"),
            PNG_MAGIC,
            Scenario::custom("x"),
            SubjectKind::Table,
            &config,
        );
        let body = serde_json::to_value(PredictRequest::from_request(&request)).unwrap();
        assert_eq!(body["parameters"]["generateAudio"], false);
    }

    #[test]
    fn running_operation() {
        let op = parse_operation(r#"{"name":"op/1"}"#).unwrap();
        assert_eq!(op.status(), OperationStatus::Running);
    }

    #[test]
    fn done_with_remote_and_inline_videos() {
        let op = parse_operation(
            r#"{"name":"op/1","done":true,"response":{"videos":[
                {"gcsUri":"gs://b/v0.mp4","mimeType":"video/mp4"},
                {"bytesBase64Encoded":"AAAA"},
                {}
            ]}}"#,
        )
        .unwrap();
        assert_matches!(op.status(), OperationStatus::Succeeded(artifacts) => {
            assert_eq!(artifacts.len(), 2);
            assert_matches!(&artifacts[0].source, ArtifactSource::Remote { uri } if uri == "gs://b/v0.mp4");
            assert_matches!(&artifacts[1].source, ArtifactSource::Inline { base64 } if base64 == "AAAA");
        });
    }

    #[test]
    fn error_payload_is_failure() {
        let op = parse_operation(
            r#"{"name":"op/1","done":true,"error":{"code":3,"message":"bad image"}}"#,
        )
        .unwrap();
        assert_eq!(
            op.status(),
            OperationStatus::Failed {
                code: 3,
                message: "bad image".into()
            }
        );
    }

    #[test]
    fn model_id_from_operation_name() {
        assert_eq!(
            model_from_operation(
                "projects/p/locations/us-central1/publishers/google/models/veo-3.0-generate-001/operations/abc"
            ),
            Some("veo-3.0-generate-001")
        );
        assert_eq!(model_from_operation("operations/abc"), None);
    }
}
