//! Closed style vocabulary for scenarios.
//!
//! Catalog files carry style tags as free text. They are parsed into
//! [`CinematicStyle`] and [`LightingMood`] when the library is loaded,
//! so nothing downstream ever matches on raw strings.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Cinematic style
// ---------------------------------------------------------------------------

/// Overall shooting style of a scenario. Drives the technique/device
/// descriptor that opens every prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CinematicStyle {
    /// Slow orbit around the product, hero framing.
    Showcase,
    /// The product placed in a lived-in home.
    Lifestyle,
    /// Macro close-ups of materials and hardware.
    Detail,
    /// Premium commercial look.
    Luxury,
    /// Clean, uncluttered architectural framing.
    Minimal,
}

impl CinematicStyle {
    pub const ALL: [CinematicStyle; 5] = [
        Self::Showcase,
        Self::Lifestyle,
        Self::Detail,
        Self::Luxury,
        Self::Minimal,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Showcase => "showcase",
            Self::Lifestyle => "lifestyle",
            Self::Detail => "detail",
            Self::Luxury => "luxury",
            Self::Minimal => "minimal",
        }
    }

    /// Technique/device descriptor placed at the start of the prompt.
    pub fn technique_clause(self) -> &'static str {
        match self {
            Self::Showcase => {
                "Cinematic product showcase filmed on a gimbal-stabilized cinema camera, shallow depth of field"
            }
            Self::Lifestyle => {
                "Warm lifestyle commercial filmed handheld-smooth on a full-frame camera, natural framing"
            }
            Self::Detail => {
                "Macro detail film shot with a 100mm lens on a motorized slider, crisp texture rendering"
            }
            Self::Luxury => {
                "High-end furniture commercial shot on an anamorphic cinema lens, polished premium look"
            }
            Self::Minimal => {
                "Minimalist architectural video on a tripod-mounted cinema camera, clean symmetrical composition"
            }
        }
    }
}

impl std::str::FromStr for CinematicStyle {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.name() == normalized)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown cinematic style '{s}'. Must be one of: {}",
                    Self::ALL.map(|v| v.name()).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Lighting mood
// ---------------------------------------------------------------------------

/// Lighting mood of a scenario. Drives the lighting clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightingMood {
    Morning,
    Daylight,
    Evening,
    Ambient,
    Studio,
}

impl LightingMood {
    pub const ALL: [LightingMood; 5] = [
        Self::Morning,
        Self::Daylight,
        Self::Evening,
        Self::Ambient,
        Self::Studio,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Daylight => "daylight",
            Self::Evening => "evening",
            Self::Ambient => "ambient",
            Self::Studio => "studio",
        }
    }

    pub fn lighting_clause(self) -> &'static str {
        match self {
            Self::Morning => "Lighting: soft golden morning sunlight streaming through a window",
            Self::Daylight => "Lighting: bright natural daylight, even and airy",
            Self::Evening => "Lighting: warm evening lamplight with gentle soft shadows",
            Self::Ambient => "Lighting: calm diffused ambient light, no harsh highlights",
            Self::Studio => "Lighting: controlled studio key and rim lights, refined reflections",
        }
    }
}

impl std::str::FromStr for LightingMood {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|mood| mood.name() == normalized)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Unknown lighting mood '{s}'. Must be one of: {}",
                    Self::ALL.map(|v| v.name()).join(", ")
                ))
            })
    }
}

// ---------------------------------------------------------------------------
// Tags + filter
// ---------------------------------------------------------------------------

/// Style tags attached to a catalog scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StyleTags {
    pub cinematic: CinematicStyle,
    pub lighting: LightingMood,
}

impl StyleTags {
    pub fn new(cinematic: CinematicStyle, lighting: LightingMood) -> Self {
        Self {
            cinematic,
            lighting,
        }
    }
}

/// Optional constraint on scenario selection. `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StyleFilter {
    pub cinematic: Option<CinematicStyle>,
    pub lighting: Option<LightingMood>,
}

impl StyleFilter {
    pub fn is_empty(&self) -> bool {
        self.cinematic.is_none() && self.lighting.is_none()
    }

    pub fn matches(&self, tags: Option<&StyleTags>) -> bool {
        if self.is_empty() {
            return true;
        }
        let Some(tags) = tags else {
            return false;
        };
        self.cinematic.map_or(true, |c| c == tags.cinematic)
            && self.lighting.map_or(true, |l| l == tags.lighting)
    }
}
