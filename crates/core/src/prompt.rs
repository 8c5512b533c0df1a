//! Prompt composition and request construction.
//!
//! Everything here is a pure function of its inputs. Scenario selection
//! (the only random step) happens before, in
//! [`crate::scenario::ScenarioSelector`].

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::config::GenerationConfig;
use crate::media::detect_media_type;
use crate::scenario::Scenario;
use crate::subject::SubjectKind;

// ---------------------------------------------------------------------------
// Fixed clauses
// ---------------------------------------------------------------------------

/// Fixed deny-list attached to every request, independent of scenario
/// and configuration.
pub const NEGATIVE_PROMPT: &str = "low quality, blurry, distorted, pixelated, \
changing the product design, altered product shape or color, removing the product, \
different furniture style, extra furniture covering the product, \
overlay text, captions, subtitles, watermark, logo, \
unnatural colors, bad lighting, chaotic scene";

/// Closing clause of every prompt.
pub const NO_OVERLAY_SUFFIX: &str = "No on-screen text, captions or watermarks.";

/// Subject-preservation clause for a classified subject.
pub fn preservation_clause(subject: SubjectKind) -> String {
    format!(
        "Keep the {} exactly as shown in the image: same design, shape, color and proportions",
        subject.noun()
    )
}

/// Audio-design clause, including the narration line.
fn audio_clause(scenario: &Scenario) -> String {
    let mut clause = String::from("Audio:");
    if !scenario.audio.trim().is_empty() {
        clause.push(' ');
        clause.push_str(scenario.audio.trim());
        clause.push(';');
    }
    clause.push_str(" a warm narrator says: \"");
    clause.push_str(scenario.voiceover.trim());
    clause.push('"');
    clause
}

fn palette_clause(scenario: &Scenario) -> Option<String> {
    let palette = scenario.palette.trim();
    (!palette.is_empty()).then(|| format!("Color palette: {palette}"))
}

// ---------------------------------------------------------------------------
// Composition
// ---------------------------------------------------------------------------

/// Assemble the prompt text.
///
/// Clause order: technique/device, subject preservation, scene addition,
/// lighting, camera movement, audio design (only when the config asks
/// for audio and the model can produce it), color palette, no-overlay suffix. Empty clauses are
/// skipped.
pub fn compose_prompt(
    scenario: &Scenario,
    subject: SubjectKind,
    config: &GenerationConfig,
) -> String {
    let mut clauses: Vec<String> = Vec::with_capacity(8);

    if let Some(style) = &scenario.style {
        clauses.push(style.cinematic.technique_clause().to_string());
    }
    clauses.push(preservation_clause(subject));
    clauses.push(scenario.scene.trim().to_string());
    if let Some(style) = &scenario.style {
        clauses.push(style.lighting.lighting_clause().to_string());
    }
    clauses.push(scenario.camera.trim().to_string());
    if config.generate_audio && config.model.supports_audio() {
        clauses.push(audio_clause(scenario));
    }
    if let Some(palette) = palette_clause(scenario) {
        clauses.push(palette);
    }

    let mut prompt = clauses
        .into_iter()
        .filter(|c| !c.is_empty())
        .map(|c| {
            let c = c.trim_end_matches('.').to_string();
            c + "."
        })
        .collect::<Vec<_>>()
        .join(" ");
    prompt.push(' ');
    prompt.push_str(NO_OVERLAY_SUFFIX);
    prompt
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A fully resolved generation request for one source image.
///
/// Immutable after construction; binds exactly one scenario.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationRequest {
    source: PathBuf,
    #[serde(skip)]
    image_base64: String,
    media_type: String,
    scenario: Scenario,
    subject: SubjectKind,
    prompt: String,
    negative_prompt: &'static str,
    config: GenerationConfig,
}

impl GenerationRequest {
    /// Build a request from raw image bytes.
    ///
    /// The media type is detected but not validated; the submitter
    /// rejects unsupported formats before any network call.
    pub fn compose(
        source: &Path,
        image_bytes: &[u8],
        scenario: Scenario,
        subject: SubjectKind,
        config: &GenerationConfig,
    ) -> Self {
        let media_type = detect_media_type(source, image_bytes);
        let prompt = compose_prompt(&scenario, subject, config);
        Self {
            source: source.to_path_buf(),
            image_base64: STANDARD.encode(image_bytes),
            media_type,
            scenario,
            subject,
            prompt,
            negative_prompt: NEGATIVE_PROMPT,
            config: config.clone(),
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// File name of the source, used as the ledger key.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    /// File stem of the source, used in artifact names.
    pub fn source_stem(&self) -> String {
        self.source
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string())
    }

    pub fn image_base64(&self) -> &str {
        &self.image_base64
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn subject(&self) -> SubjectKind {
        self.subject
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn negative_prompt(&self) -> &str {
        self.negative_prompt
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AspectRatio, Resolution, VeoModel};
    use crate::scenario::ScenarioLibrary;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0];

    fn scenario() -> Scenario {
        ScenarioLibrary::builtin()
            .get("evening_ambiance")
            .cloned()
            .unwrap()
    }

    #[test]
    fn clauses_appear_in_order() {
        let s = scenario();
        let prompt = compose_prompt(&s, SubjectKind::Table, &GenerationConfig::default());
        let style = s.style.unwrap();

        let positions = [
            prompt.find(style.cinematic.technique_clause()).unwrap(),
            prompt.find("Keep the table exactly").unwrap(),
            prompt.find(&s.scene).unwrap(),
            prompt.find(style.lighting.lighting_clause()).unwrap(),
            prompt.find(&s.camera).unwrap(),
            prompt.find("Audio:").unwrap(),
            prompt.find("Color palette:").unwrap(),
            prompt.find(NO_OVERLAY_SUFFIX).unwrap(),
        ];
        assert!(positions.windows(2).all(|w| w[0] < w[1]), "{prompt}");
        assert!(prompt.ends_with(NO_OVERLAY_SUFFIX));
    }

    #[test]
    fn audio_clause_carries_voiceover() {
        let s = scenario();
        let prompt = compose_prompt(&s, SubjectKind::Table, &GenerationConfig::default());
        assert!(prompt.contains(&s.voiceover));
    }

    #[test]
    fn audio_clause_dropped_without_audio() {
        let s = scenario();
        let config = GenerationConfig {
            generate_audio: false,
            ..Default::default()
        };
        let prompt = compose_prompt(&s, SubjectKind::Table, &config);
        assert!(!prompt.contains("Audio:"));
        assert!(!prompt.contains(&s.voiceover));
    }

    #[test]
    fn audio_clause_dropped_for_silent_models() {
        let s = scenario();
        let config = GenerationConfig {
            model: VeoModel::Veo2,
            generate_audio: true,
            ..Default::default()
        };
        let prompt = compose_prompt(&s, SubjectKind::Table, &config);
        assert!(!prompt.contains("Audio:"));
        assert!(!prompt.contains(&s.voiceover));
    }

    #[test]
    fn custom_scenario_prompt_is_preservation_plus_override() {
        let s = Scenario::custom("Camera moves around the sofa in a loft");
        let prompt = compose_prompt(&s, SubjectKind::Sofa, &GenerationConfig::default());
        assert!(prompt.starts_with("Keep the sofa exactly as shown"));
        assert!(prompt.contains("Camera moves around the sofa in a loft."));
        assert!(!prompt.contains("Lighting:"));
        assert!(!prompt.contains("Color palette:"));
    }

    #[test]
    fn composition_is_deterministic() {
        let s = scenario();
        let config = GenerationConfig::default();
        assert_eq!(
            compose_prompt(&s, SubjectKind::Bed, &config),
            compose_prompt(&s, SubjectKind::Bed, &config)
        );
    }

    #[test]
    fn request_binds_config_and_fixed_negative_prompt() {
        let config = GenerationConfig {
            aspect_ratio: AspectRatio::Portrait,
            resolution: Resolution::Hd,
            duration_secs: 6,
            generate_audio: false,
            ..Default::default()
        };
        let request = GenerationRequest::compose(
            Path::new("in/lux_table.png"),
            PNG_MAGIC,
            scenario(),
            SubjectKind::Table,
            &config,
        );
        assert_eq!(request.config().aspect_ratio, AspectRatio::Portrait);
        assert_eq!(request.config().resolution, Resolution::Hd);
        assert_eq!(request.config().duration_secs, 6);
        assert!(!request.config().generate_audio);
        assert_eq!(request.negative_prompt(), NEGATIVE_PROMPT);
        assert_eq!(request.media_type(), "image/png");
        assert_eq!(request.source_name(), "lux_table.png");
        assert_eq!(request.source_stem(), "lux_table");
        assert_eq!(request.image_base64(), STANDARD.encode(PNG_MAGIC));
    }

    #[test]
    fn negative_prompt_does_not_depend_on_config() {
        let a = GenerationRequest::compose(
            Path::new("a.png"),
            PNG_MAGIC,
            scenario(),
            SubjectKind::Table,
            &GenerationConfig::default(),
        );
        let b = GenerationRequest::compose(
            Path::new("b.png"),
            PNG_MAGIC,
            Scenario::custom("anything"),
            SubjectKind::Bed,
            &GenerationConfig::preview(),
        );
        assert_eq!(a.negative_prompt(), b.negative_prompt());
    }
}
