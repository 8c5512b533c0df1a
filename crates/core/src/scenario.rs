//! Scenario library and selection.
//!
//! A scenario is a narrative template: what to add around the product,
//! how the camera moves, what the soundtrack sounds like, and the fixed
//! voiceover line read over the clip. The library is loaded once (the
//! built-in catalog or a JSON file) and is read-only afterwards.

use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::style::{CinematicStyle, LightingMood, StyleFilter, StyleTags};

/// Id of the one-off scenario synthesized from override text.
pub const CUSTOM_SCENARIO_ID: &str = "custom";

/// Voiceover used for override-text scenarios.
pub const DEFAULT_VOICEOVER: &str =
    "Мебель TURAN - качество и стиль для вашего дома.";

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// A narrative template for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    /// Short tag describing what the scenario emphasizes.
    pub focus: String,
    /// Scene-addition clause (what surrounds the product).
    pub scene: String,
    /// Camera-movement clause.
    pub camera: String,
    /// Audio-design clause (music and ambience, not the narration).
    pub audio: String,
    /// Color-palette clause.
    pub palette: String,
    /// Localized narration read over the clip.
    pub voiceover: String,
    /// `None` only for the synthesized override scenario.
    pub style: Option<StyleTags>,
}

impl Scenario {
    /// One-off scenario wrapping caller-supplied text as the scene clause.
    pub fn custom(override_text: &str) -> Self {
        Self {
            id: CUSTOM_SCENARIO_ID.to_string(),
            focus: "custom_scene".to_string(),
            scene: override_text.trim().to_string(),
            camera: String::new(),
            audio: String::new(),
            palette: String::new(),
            voiceover: DEFAULT_VOICEOVER.to_string(),
            style: None,
        }
    }

    pub fn is_custom(&self) -> bool {
        self.id == CUSTOM_SCENARIO_ID
    }
}

/// Catalog file entry. Style tags are free text here and get parsed into
/// the closed enums by [`ScenarioLibrary::from_json_str`].
#[derive(Debug, Deserialize)]
struct CatalogEntry {
    id: String,
    focus: String,
    scene: String,
    #[serde(default)]
    camera: String,
    #[serde(default)]
    audio: String,
    #[serde(default)]
    palette: String,
    voiceover: String,
    cinematic_style: String,
    lighting_mood: String,
}

impl TryFrom<CatalogEntry> for Scenario {
    type Error = CoreError;

    fn try_from(entry: CatalogEntry) -> Result<Self, Self::Error> {
        if entry.id.trim().is_empty() {
            return Err(CoreError::Validation(
                "Scenario id must not be empty".to_string(),
            ));
        }
        if entry.id == CUSTOM_SCENARIO_ID {
            return Err(CoreError::Validation(format!(
                "Scenario id '{CUSTOM_SCENARIO_ID}' is reserved"
            )));
        }
        let cinematic: CinematicStyle = entry.cinematic_style.parse()?;
        let lighting: LightingMood = entry.lighting_mood.parse()?;
        Ok(Self {
            id: entry.id,
            focus: entry.focus,
            scene: entry.scene,
            camera: entry.camera,
            audio: entry.audio,
            palette: entry.palette,
            voiceover: entry.voiceover,
            style: Some(StyleTags::new(cinematic, lighting)),
        })
    }
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// Immutable scenario catalog.
#[derive(Debug, Clone)]
pub struct ScenarioLibrary {
    scenarios: Vec<Scenario>,
}

impl ScenarioLibrary {
    /// Build a library, rejecting empty catalogs and duplicate ids.
    pub fn new(scenarios: Vec<Scenario>) -> Result<Self, CoreError> {
        if scenarios.is_empty() {
            return Err(CoreError::Validation(
                "Scenario catalog must contain at least one scenario".to_string(),
            ));
        }
        let mut seen = std::collections::HashSet::new();
        for s in &scenarios {
            if !seen.insert(s.id.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Duplicate scenario id '{}'",
                    s.id
                )));
            }
        }
        Ok(Self { scenarios })
    }

    /// The catalog shipped with the tool.
    pub fn builtin() -> Self {
        Self {
            scenarios: builtin_catalog(),
        }
    }

    /// Parse a JSON array of catalog entries.
    pub fn from_json_str(json: &str) -> Result<Self, CoreError> {
        let entries: Vec<CatalogEntry> = serde_json::from_str(json)?;
        let scenarios = entries
            .into_iter()
            .map(Scenario::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(scenarios)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, CoreError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn all(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn by_focus(&self, focus: &str) -> Vec<&Scenario> {
        self.scenarios.iter().filter(|s| s.focus == focus).collect()
    }

    pub fn matching(&self, filter: &StyleFilter) -> Vec<&Scenario> {
        self.scenarios
            .iter()
            .filter(|s| filter.matches(s.style.as_ref()))
            .collect()
    }

    /// Scenarios grouped by focus, in first-seen order.
    pub fn grouped_by_focus(&self) -> Vec<(&str, Vec<&Scenario>)> {
        let mut groups: Vec<(&str, Vec<&Scenario>)> = Vec::new();
        for s in &self.scenarios {
            match groups.iter_mut().find(|(focus, _)| *focus == s.focus) {
                Some((_, members)) => members.push(s),
                None => groups.push((s.focus.as_str(), vec![s])),
            }
        }
        groups
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// The only impure step of request composition.
///
/// Seeded selectors replay the same sequence of picks for the same
/// catalog and the same sequence of calls.
pub struct ScenarioSelector {
    rng: StdRng,
}

impl ScenarioSelector {
    /// Seeded when `seed` is given, OS entropy otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    /// Pick the scenario for one item.
    ///
    /// Override text always wins and yields a [`Scenario::custom`].
    /// Otherwise one catalog entry matching `filter` is drawn uniformly;
    /// when nothing matches, the whole catalog is used instead.
    pub fn select(
        &mut self,
        library: &ScenarioLibrary,
        override_text: Option<&str>,
        filter: &StyleFilter,
    ) -> Scenario {
        if let Some(text) = override_text.filter(|t| !t.trim().is_empty()) {
            return Scenario::custom(text);
        }

        let mut candidates = library.matching(filter);
        if candidates.is_empty() {
            tracing::warn!(
                ?filter,
                "No scenario matches the style filter, selecting from the whole catalog",
            );
            candidates = library.all().iter().collect();
        }

        // The library constructor guarantees at least one scenario.
        let chosen = candidates
            .choose(&mut self.rng)
            .copied()
            .unwrap_or(&library.all()[0]);
        tracing::debug!(scenario_id = %chosen.id, focus = %chosen.focus, "Scenario selected");
        chosen.clone()
    }
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    focus: &str,
    scene: &str,
    camera: &str,
    audio: &str,
    palette: &str,
    voiceover: &str,
    cinematic: CinematicStyle,
    lighting: LightingMood,
) -> Scenario {
    Scenario {
        id: id.to_string(),
        focus: focus.to_string(),
        scene: scene.to_string(),
        camera: camera.to_string(),
        audio: audio.to_string(),
        palette: palette.to_string(),
        voiceover: voiceover.to_string(),
        style: Some(StyleTags::new(cinematic, lighting)),
    }
}

fn builtin_catalog() -> Vec<Scenario> {
    use CinematicStyle::*;
    use LightingMood::*;

    vec![
        entry(
            "cozy_bedroom_view",
            "bedroom_setting",
            "Add an elegant bedroom interior with a cozy, lived-in atmosphere",
            "Camera slowly pans around the product, revealing it from several angles",
            "Soft acoustic guitar with quiet room tone",
            "Warm beige, cream and light oak tones",
            "Мебель TURAN - идеальное решение для вашей спальни. Стильный дизайн и функциональность в одном.",
            Showcase,
            Morning,
        ),
        entry(
            "morning_light_showcase",
            "morning_lighting",
            "Add a bright bedroom corner where sunlight falls across the product surfaces",
            "Camera moves in a smooth arc around the furniture, catching highlights on glass and mirror",
            "Gentle piano melody with birdsong outside the window",
            "Golden honey and soft white tones",
            "Начните утро с красоты! Мебель TURAN - ваш ежедневный помощник.",
            Showcase,
            Morning,
        ),
        entry(
            "modern_interior_tour",
            "interior_design",
            "Add a modern, stylish apartment interior with contemporary decor",
            "Camera tours around the product from multiple angles in one continuous move",
            "Light minimal electronic beat",
            "Neutral greys with muted sage accents",
            "TURAN гармонично впишется в любой современный интерьер. Качество и стиль для вашего дома.",
            Minimal,
            Ambient,
        ),
        entry(
            "evening_ambiance",
            "evening_comfort",
            "Add a cozy evening room with a reading lamp and a soft throw blanket",
            "Camera gently circles the product at a calm, unhurried pace",
            "Relaxed lo-fi music with faint crackle of a fireplace",
            "Amber, walnut and deep burgundy tones",
            "Вечерний уют с мебелью TURAN. Расслабьтесь и наслаждайтесь каждым днём.",
            Lifestyle,
            Evening,
        ),
        entry(
            "feature_highlight",
            "product_features",
            "Add a clean setting that puts drawers, handles and surfaces in focus",
            "Close-up shots transition to a wide angle, lingering on construction details",
            "Subtle clicks of drawers opening over a light corporate track",
            "Crisp white with chrome and natural wood accents",
            "Вместительные ящики, продуманная фурнитура, прочные материалы. TURAN - продуманно до мелочей.",
            Detail,
            Studio,
        ),
        entry(
            "lifestyle_comfort",
            "family_lifestyle",
            "Add a comfortable family home with everyday objects placed naturally nearby",
            "Camera moves smoothly through the room and settles on the product",
            "Warm acoustic track with distant family chatter",
            "Soft pastel tones with warm wood",
            "Сделайте свой дом уютнее с мебелью TURAN. Качество, которому доверяют тысячи семей.",
            Lifestyle,
            Daylight,
        ),
        entry(
            "premium_quality",
            "quality_premium",
            "Add a luxury interior with marble, velvet and brass details",
            "Elegant slow dolly-in showing the premium build quality",
            "Orchestral strings with a restrained, confident rhythm",
            "Deep navy, gold and ivory tones",
            "Премиум качество по доступной цене. Мебель TURAN - инвестиция в ваш комфорт на годы.",
            Luxury,
            Studio,
        ),
        entry(
            "daily_routine",
            "daily_integration",
            "Add a peaceful morning routine scene around the product",
            "Camera flows around the product showing how it fits into daily life",
            "Calm morning playlist with the soft sound of a kettle",
            "Fresh white, light blue and birch tones",
            "Каждое утро начинается с вас. TURAN - ваш персональный уголок уюта и вдохновения.",
            Lifestyle,
            Morning,
        ),
        entry(
            "space_solution",
            "space_efficiency",
            "Add a smart, compact room layout with organized storage in view",
            "Camera pulls back to demonstrate how the product optimizes the space",
            "Upbeat light percussion",
            "Clean white with graphite accents",
            "Умное использование пространства с TURAN. Стиль, функциональность и порядок в вашем доме.",
            Minimal,
            Daylight,
        ),
        entry(
            "brand_trust",
            "brand_reliability",
            "Add a reliable, welcoming family home environment",
            "Steady, stable camera glide conveying solidity and trust",
            "Warm, confident instrumental theme",
            "Earthy browns and soft cream tones",
            "TURAN - казахстанский бренд, которому доверяют. Надёжная мебель для вашего дома уже более 10 лет.",
            Luxury,
            Ambient,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn builtin_catalog_is_valid() {
        let library = ScenarioLibrary::builtin();
        assert_eq!(library.len(), 10);
        assert!(ScenarioLibrary::new(library.all().to_vec()).is_ok());
        assert!(library.all().iter().all(|s| s.style.is_some()));
    }

    #[test]
    fn override_text_yields_custom_scenario() {
        let library = ScenarioLibrary::builtin();
        let mut selector = ScenarioSelector::new(Some(1));
        let scenario = selector.select(
            &library,
            Some("Camera orbits in a sunlit loft"),
            &StyleFilter::default(),
        );
        assert_eq!(scenario.id, CUSTOM_SCENARIO_ID);
        assert_eq!(scenario.scene, "Camera orbits in a sunlit loft");
        assert_eq!(scenario.voiceover, DEFAULT_VOICEOVER);
        assert!(scenario.style.is_none());
    }

    #[test]
    fn blank_override_is_ignored() {
        let library = ScenarioLibrary::builtin();
        let mut selector = ScenarioSelector::new(Some(1));
        let scenario = selector.select(&library, Some("   "), &StyleFilter::default());
        assert!(!scenario.is_custom());
    }

    #[test]
    fn seeded_selection_is_reproducible() {
        let library = ScenarioLibrary::builtin();
        let run = |seed| {
            let mut selector = ScenarioSelector::new(Some(seed));
            (0..20)
                .map(|_| selector.select(&library, None, &StyleFilter::default()).id)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn filter_restricts_candidates() {
        let library = ScenarioLibrary::builtin();
        let filter = StyleFilter {
            cinematic: Some(CinematicStyle::Luxury),
            lighting: None,
        };
        let mut selector = ScenarioSelector::new(Some(7));
        for _ in 0..20 {
            let s = selector.select(&library, None, &filter);
            assert_eq!(s.style.unwrap().cinematic, CinematicStyle::Luxury);
        }
    }

    #[test]
    fn unmatched_filter_falls_back_to_catalog() {
        let library = ScenarioLibrary::builtin();
        let filter = StyleFilter {
            cinematic: Some(CinematicStyle::Detail),
            lighting: Some(LightingMood::Evening),
        };
        assert!(library.matching(&filter).is_empty());
        let mut selector = ScenarioSelector::new(Some(3));
        let s = selector.select(&library, None, &filter);
        assert!(library.get(&s.id).is_some());
    }

    #[test]
    fn json_catalog_normalizes_style_strings() {
        let json = r#"[
            {"id": "a", "focus": "f", "scene": "Add a loft", "voiceover": "v",
             "cinematic_style": "Luxury", "lighting_mood": " evening "}
        ]"#;
        let library = ScenarioLibrary::from_json_str(json).unwrap();
        let style = library.get("a").unwrap().style.unwrap();
        assert_eq!(style.cinematic, CinematicStyle::Luxury);
        assert_eq!(style.lighting, LightingMood::Evening);
        assert_eq!(library.get("a").unwrap().camera, "");
    }

    #[test]
    fn json_catalog_rejects_unknown_style() {
        let json = r#"[{"id": "a", "focus": "f", "scene": "s", "voiceover": "v",
            "cinematic_style": "noir", "lighting_mood": "evening"}]"#;
        assert_matches!(
            ScenarioLibrary::from_json_str(json),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn json_catalog_rejects_duplicates_and_reserved_ids() {
        let dup = r#"[
            {"id": "a", "focus": "f", "scene": "s", "voiceover": "v", "cinematic_style": "detail", "lighting_mood": "studio"},
            {"id": "a", "focus": "g", "scene": "s", "voiceover": "v", "cinematic_style": "detail", "lighting_mood": "studio"}
        ]"#;
        assert!(ScenarioLibrary::from_json_str(dup).is_err());

        let reserved = r#"[{"id": "custom", "focus": "f", "scene": "s", "voiceover": "v",
            "cinematic_style": "detail", "lighting_mood": "studio"}]"#;
        assert!(ScenarioLibrary::from_json_str(reserved).is_err());

        assert!(ScenarioLibrary::from_json_str("[]").is_err());
    }

    #[test]
    fn lookup_helpers() {
        let library = ScenarioLibrary::builtin();
        assert_eq!(library.by_focus("evening_comfort").len(), 1);
        assert!(library.get("premium_quality").is_some());
        assert!(library.get("missing").is_none());
        let groups = library.grouped_by_focus();
        assert_eq!(groups.len(), 10);
        assert_eq!(groups[0].0, "bedroom_setting");
    }
}
