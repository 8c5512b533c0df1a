//! Generated output units.

use serde::{Deserialize, Serialize};

/// Where the bytes of one generated video live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ArtifactSource {
    /// Object in remote storage, e.g. `gs://bucket/path/video.mp4`.
    Remote { uri: String },
    /// Base64 payload returned inline by the service.
    Inline {
        #[serde(skip_serializing)]
        base64: String,
    },
}

/// One generated video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub source: ArtifactSource,
    pub mime_type: Option<String>,
}

impl Artifact {
    pub fn remote(uri: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            source: ArtifactSource::Remote { uri: uri.into() },
            mime_type,
        }
    }

    pub fn inline(base64: impl Into<String>, mime_type: Option<String>) -> Self {
        Self {
            source: ArtifactSource::Inline {
                base64: base64.into(),
            },
            mime_type,
        }
    }

    /// File extension for the artifact's MIME type, `mp4` when unknown.
    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_deref() {
            Some("video/webm") => "webm",
            Some("video/quicktime") => "mov",
            _ => "mp4",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_defaults_to_mp4() {
        assert_eq!(Artifact::remote("gs://b/o", None).extension(), "mp4");
        assert_eq!(
            Artifact::inline("AAAA", Some("video/mp4".into())).extension(),
            "mp4"
        );
        assert_eq!(
            Artifact::inline("AAAA", Some("video/webm".into())).extension(),
            "webm"
        );
    }
}
