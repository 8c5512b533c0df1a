//! Resolved generation parameters and presets.
//!
//! A [`GenerationConfig`] is built once per run by the caller (the worker
//! reads it from the environment) and bound into every request verbatim.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Limits and defaults
// ---------------------------------------------------------------------------

/// Shortest clip the service accepts, in seconds.
pub const MIN_DURATION_SECS: u32 = 4;
/// Longest clip the service accepts, in seconds.
pub const MAX_DURATION_SECS: u32 = 8;
/// Default clip length.
pub const DEFAULT_DURATION_SECS: u32 = 8;
/// Maximum number of videos requested per image.
pub const MAX_SAMPLE_COUNT: u32 = 4;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Video model to submit to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VeoModel {
    #[serde(rename = "veo-2.0-generate-001")]
    Veo2,
    #[serde(rename = "veo-2.0-generate-exp")]
    Veo2Exp,
    #[serde(rename = "veo-3.0-generate-001")]
    Veo3,
    #[serde(rename = "veo-3.0-fast-generate-001")]
    Veo3Fast,
    #[serde(rename = "veo-3.0-generate-preview")]
    Veo3Preview,
    #[serde(rename = "veo-3.0-fast-generate-preview")]
    Veo3FastPreview,
}

impl VeoModel {
    pub const ALL: [VeoModel; 6] = [
        Self::Veo2,
        Self::Veo2Exp,
        Self::Veo3,
        Self::Veo3Fast,
        Self::Veo3Preview,
        Self::Veo3FastPreview,
    ];

    /// Model id as used in the endpoint path.
    pub fn id(self) -> &'static str {
        match self {
            Self::Veo2 => "veo-2.0-generate-001",
            Self::Veo2Exp => "veo-2.0-generate-exp",
            Self::Veo3 => "veo-3.0-generate-001",
            Self::Veo3Fast => "veo-3.0-fast-generate-001",
            Self::Veo3Preview => "veo-3.0-generate-preview",
            Self::Veo3FastPreview => "veo-3.0-fast-generate-preview",
        }
    }

    /// Parse a full model id or its short alias (`veo-3.0-fast`).
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        let name = name.trim();
        match name {
            "veo-2.0" => return Ok(Self::Veo2),
            "veo-2.0-exp" => return Ok(Self::Veo2Exp),
            "veo-3.0" => return Ok(Self::Veo3),
            "veo-3.0-fast" => return Ok(Self::Veo3Fast),
            "veo-3.0-preview" => return Ok(Self::Veo3Preview),
            "veo-3.0-fast-preview" => return Ok(Self::Veo3FastPreview),
            _ => {}
        }
        Self::ALL
            .into_iter()
            .find(|m| m.id() == name)
            .ok_or_else(|| CoreError::Validation(format!("Unknown model '{name}'")))
    }

    /// Only the Veo 3 family renders an audio track.
    pub fn supports_audio(self) -> bool {
        !matches!(self, Self::Veo2 | Self::Veo2Exp)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// 16:9 for YouTube and Facebook.
    #[serde(rename = "16:9")]
    Landscape,
    /// 9:16 for Stories, Reels and TikTok.
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "16:9",
            Self::Portrait => "9:16",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_lowercase().as_str() {
            "16:9" | "landscape" => Ok(Self::Landscape),
            "9:16" | "portrait" => Ok(Self::Portrait),
            other => Err(CoreError::Validation(format!(
                "Invalid aspect ratio '{other}'. Must be one of: 16:9, 9:16"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resolution {
    #[serde(rename = "720p")]
    Hd,
    #[serde(rename = "1080p")]
    FullHd,
}

impl Resolution {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hd => "720p",
            Self::FullHd => "1080p",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_lowercase().as_str() {
            "720p" | "hd" => Ok(Self::Hd),
            "1080p" | "full_hd" | "fullhd" => Ok(Self::FullHd),
            other => Err(CoreError::Validation(format!(
                "Invalid resolution '{other}'. Must be one of: 720p, 1080p"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompressionQuality {
    Optimized,
    Lossless,
}

impl CompressionQuality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Optimized => "optimized",
            Self::Lossless => "lossless",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name.trim().to_lowercase().as_str() {
            "optimized" => Ok(Self::Optimized),
            "lossless" => Ok(Self::Lossless),
            other => Err(CoreError::Validation(format!(
                "Invalid compression quality '{other}'. Must be one of: optimized, lossless"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Generation config
// ---------------------------------------------------------------------------

/// Parameters bound into every request of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub model: VeoModel,
    pub duration_secs: u32,
    pub aspect_ratio: AspectRatio,
    pub resolution: Resolution,
    pub sample_count: u32,
    pub generate_audio: bool,
    pub enhance_prompt: bool,
    pub compression_quality: CompressionQuality,
    /// Person generation policy passed through to the service.
    pub person_generation: String,
    pub seed: Option<u32>,
    /// Remote destination prefix (`gs://bucket/path/`). When set the
    /// service writes videos there instead of returning them inline.
    pub storage_uri: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: VeoModel::Veo3,
            duration_secs: DEFAULT_DURATION_SECS,
            aspect_ratio: AspectRatio::Landscape,
            resolution: Resolution::FullHd,
            sample_count: 1,
            generate_audio: true,
            enhance_prompt: true,
            compression_quality: CompressionQuality::Optimized,
            person_generation: "allow_adult".to_string(),
            seed: None,
            storage_uri: None,
        }
    }
}

impl GenerationConfig {
    /// Fast, cheap settings for checking a catalog: fast model, 4 s, 720p.
    pub fn preview() -> Self {
        Self {
            model: VeoModel::Veo3Fast,
            duration_secs: MIN_DURATION_SECS,
            resolution: Resolution::Hd,
            ..Self::default()
        }
    }

    /// Copy of `self` with a different aspect ratio.
    pub fn with_aspect_ratio(&self, aspect_ratio: AspectRatio) -> Self {
        Self {
            aspect_ratio,
            ..self.clone()
        }
    }

    /// Check the values the service would reject anyway.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&self.duration_secs) {
            return Err(CoreError::Validation(format!(
                "duration_secs must be between {MIN_DURATION_SECS} and {MAX_DURATION_SECS}, got {}",
                self.duration_secs
            )));
        }
        if !(1..=MAX_SAMPLE_COUNT).contains(&self.sample_count) {
            return Err(CoreError::Validation(format!(
                "sample_count must be between 1 and {MAX_SAMPLE_COUNT}, got {}",
                self.sample_count
            )));
        }
        if let Some(uri) = &self.storage_uri {
            if !uri.starts_with("gs://") {
                return Err(CoreError::Validation(format!(
                    "storage_uri must start with gs://, got '{uri}'"
                )));
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Social media presets
// ---------------------------------------------------------------------------

/// A publishing target with its own output subdirectory.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformPreset {
    /// Subdirectory name under the output root.
    pub platform: &'static str,
    pub config: GenerationConfig,
}

/// Landscape for YouTube, portrait for Instagram Stories and TikTok,
/// all derived from `base`.
pub fn social_media_presets(base: &GenerationConfig) -> Vec<PlatformPreset> {
    vec![
        PlatformPreset {
            platform: "youtube",
            config: base.with_aspect_ratio(AspectRatio::Landscape),
        },
        PlatformPreset {
            platform: "instagram_stories",
            config: base.with_aspect_ratio(AspectRatio::Portrait),
        },
        PlatformPreset {
            platform: "tiktok",
            config: base.with_aspect_ratio(AspectRatio::Portrait),
        },
    ]
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GenerationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.duration_secs, 8);
        assert_eq!(config.model, VeoModel::Veo3);
    }

    #[test]
    fn preview_is_short_and_hd() {
        let config = GenerationConfig::preview();
        assert_eq!(config.duration_secs, 4);
        assert_eq!(config.resolution, Resolution::Hd);
        assert_eq!(config.model, VeoModel::Veo3Fast);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn duration_out_of_range_rejected() {
        let config = GenerationConfig {
            duration_secs: 9,
            ..Default::default()
        };
        assert_matches!(config.validate(), Err(CoreError::Validation(_)));
    }

    #[test]
    fn sample_count_out_of_range_rejected() {
        let config = GenerationConfig {
            sample_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn storage_uri_must_be_gcs() {
        let config = GenerationConfig {
            storage_uri: Some("s3://bucket/".into()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn model_aliases_resolve() {
        assert_eq!(VeoModel::from_name("veo-3.0-fast").unwrap(), VeoModel::Veo3Fast);
        assert_eq!(
            VeoModel::from_name("veo-3.0-generate-001").unwrap(),
            VeoModel::Veo3
        );
        assert!(VeoModel::from_name("veo-9").is_err());
        assert!(!VeoModel::Veo2.supports_audio());
    }

    #[test]
    fn social_presets_cover_three_platforms() {
        let presets = social_media_presets(&GenerationConfig::default());
        let platforms: Vec<_> = presets.iter().map(|p| p.platform).collect();
        assert_eq!(platforms, ["youtube", "instagram_stories", "tiktok"]);
        assert_eq!(presets[0].config.aspect_ratio, AspectRatio::Landscape);
        assert_eq!(presets[1].config.aspect_ratio, AspectRatio::Portrait);
        assert_eq!(presets[2].config.aspect_ratio, AspectRatio::Portrait);
    }

    #[test]
    fn enum_names_parse() {
        assert_eq!(AspectRatio::from_name("portrait").unwrap(), AspectRatio::Portrait);
        assert_eq!(Resolution::from_name("720p").unwrap(), Resolution::Hd);
        assert_eq!(
            CompressionQuality::from_name("Lossless").unwrap(),
            CompressionQuality::Lossless
        );
    }
}
