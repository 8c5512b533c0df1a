//! Worker configuration.
//!
//! Everything is read from environment variables (a `.env` file is loaded
//! first by `main`). Values are trimmed, blank values count as unset, and
//! parse failures name the offending variable.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use showreel_core::config::{
    AspectRatio, CompressionQuality, GenerationConfig, Resolution, VeoModel,
};
use showreel_core::error::CoreError;
use showreel_core::style::{CinematicStyle, LightingMood, StyleFilter};
use showreel_pipeline::ledger::DEFAULT_LEDGER_FILE;
use showreel_veo::poller::PollerConfig;

/// What the worker does on this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Every image in the input directory.
    Batch,
    /// One image, optionally with a custom prompt.
    Single,
    /// One batch per social platform preset.
    Social,
    /// Compose requests and print them, no submission.
    DryRun,
    /// Print the scenario catalog grouped by focus.
    ListScenarios,
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "batch" => Ok(Self::Batch),
            "single" => Ok(Self::Single),
            "social" | "social-media" => Ok(Self::Social),
            "dry-run" | "dry_run" | "plan" => Ok(Self::DryRun),
            "scenarios" | "list-scenarios" => Ok(Self::ListScenarios),
            other => Err(ConfigError::Invalid {
                key: "SHOWREEL_MODE",
                reason: format!(
                    "unknown mode '{other}', expected batch, single, social, dry-run or scenarios"
                ),
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Worker configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub mode: RunMode,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Source image for [`RunMode::Single`].
    pub input_image: Option<PathBuf>,
    /// Scene text replacing the catalog scenario in single mode.
    pub custom_prompt: Option<String>,
    pub project_id: Option<String>,
    pub location: String,
    pub generation: GenerationConfig,
    pub brand_prefix: String,
    pub style_filter: StyleFilter,
    pub selection_seed: Option<u64>,
    pub max_in_flight: usize,
    pub poller: PollerConfig,
    /// Catalog file replacing the built-in scenarios.
    pub scenario_catalog: Option<PathBuf>,
    /// Keyword table replacing the built-in subject keywords.
    pub subject_keywords: Option<PathBuf>,
    pub ledger_path: PathBuf,
    pub analytics_path: Option<PathBuf>,
    /// Explicit bearer token; application default credentials otherwise.
    pub access_token: Option<String>,
}

impl WorkerConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                 | Default                             |
    /// |-------------------------|-------------------------------------|
    /// | `SHOWREEL_MODE`         | `batch`                             |
    /// | `INPUT_DIR`             | `input_images`                      |
    /// | `OUTPUT_DIR`            | `generated_videos`                  |
    /// | `INPUT_IMAGE`           | (required in `single` mode)         |
    /// | `CUSTOM_PROMPT`         | none                                |
    /// | `GOOGLE_CLOUD_PROJECT`  | (required unless nothing is sent)   |
    /// | `GOOGLE_CLOUD_LOCATION` | `us-central1`                       |
    /// | `PREVIEW`               | `false` (fast model, 4 s, 720p)     |
    /// | `VEO_MODEL`             | `veo-3.0-generate-001`              |
    /// | `ASPECT_RATIO`          | `16:9`                              |
    /// | `RESOLUTION`            | `1080p`                             |
    /// | `DURATION_SECS`         | `8`                                 |
    /// | `SAMPLE_COUNT`          | `1`                                 |
    /// | `GENERATE_AUDIO`        | `true`                              |
    /// | `ENHANCE_PROMPT`        | `true`                              |
    /// | `COMPRESSION_QUALITY`   | `optimized`                         |
    /// | `PERSON_GENERATION`     | `allow_adult`                       |
    /// | `GENERATION_SEED`       | none                                |
    /// | `STORAGE_URI`           | none (videos returned inline)       |
    /// | `BRAND_PREFIX`          | `turan`                             |
    /// | `CINEMATIC_STYLE`       | none                                |
    /// | `LIGHTING_MOOD`         | none                                |
    /// | `SELECTION_SEED`        | none                                |
    /// | `MAX_IN_FLIGHT`         | `1`                                 |
    /// | `POLL_INTERVAL_SECS`    | `10`                                |
    /// | `POLL_RETRY_SECS`       | `5`                                 |
    /// | `POLL_TIMEOUT_SECS`     | `600`                               |
    /// | `SCENARIO_CATALOG`      | none (built-in catalog)             |
    /// | `SUBJECT_KEYWORDS_FILE` | none (built-in keywords)            |
    /// | `LEDGER_PATH`           | `generated_showcase_scenarios.json` |
    /// | `ANALYTICS_PATH`        | none (no export)                    |
    /// | `GOOGLE_ACCESS_TOKEN`   | none (application default creds)    |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mode = match var("SHOWREEL_MODE") {
            Some(v) => v.parse()?,
            None => RunMode::Batch,
        };

        let preview = parse_bool(&var, "PREVIEW", false)?;
        let mut generation = if preview {
            GenerationConfig::preview()
        } else {
            GenerationConfig::default()
        };
        if let Some(v) = var("VEO_MODEL") {
            generation.model = core_value("VEO_MODEL", VeoModel::from_name(&v))?;
        }
        if let Some(v) = var("ASPECT_RATIO") {
            generation.aspect_ratio = core_value("ASPECT_RATIO", AspectRatio::from_name(&v))?;
        }
        if let Some(v) = var("RESOLUTION") {
            generation.resolution = core_value("RESOLUTION", Resolution::from_name(&v))?;
        }
        if let Some(v) = var("COMPRESSION_QUALITY") {
            generation.compression_quality =
                core_value("COMPRESSION_QUALITY", CompressionQuality::from_name(&v))?;
        }
        generation.duration_secs = parse_num(&var, "DURATION_SECS", generation.duration_secs)?;
        generation.sample_count = parse_num(&var, "SAMPLE_COUNT", generation.sample_count)?;
        generation.generate_audio = parse_bool(&var, "GENERATE_AUDIO", generation.generate_audio)?;
        generation.enhance_prompt = parse_bool(&var, "ENHANCE_PROMPT", generation.enhance_prompt)?;
        if let Some(v) = var("PERSON_GENERATION") {
            generation.person_generation = v;
        }
        generation.seed = parse_opt(&var, "GENERATION_SEED")?;
        generation.storage_uri = var("STORAGE_URI");
        core_value("generation settings", generation.validate())?;

        let style_filter = StyleFilter {
            cinematic: var("CINEMATIC_STYLE")
                .map(|v| core_value("CINEMATIC_STYLE", v.parse::<CinematicStyle>()))
                .transpose()?,
            lighting: var("LIGHTING_MOOD")
                .map(|v| core_value("LIGHTING_MOOD", v.parse::<LightingMood>()))
                .transpose()?,
        };

        let max_in_flight: usize = parse_num(&var, "MAX_IN_FLIGHT", 1)?;
        if max_in_flight == 0 {
            return Err(ConfigError::Invalid {
                key: "MAX_IN_FLIGHT",
                reason: "must be at least 1".into(),
            });
        }

        let poller = PollerConfig {
            interval: parse_secs(&var, "POLL_INTERVAL_SECS", 10)?,
            retry_interval: parse_secs(&var, "POLL_RETRY_SECS", 5)?,
            budget: parse_secs(&var, "POLL_TIMEOUT_SECS", 600)?,
        };

        let input_image = var("INPUT_IMAGE").map(PathBuf::from);
        if mode == RunMode::Single && input_image.is_none() {
            return Err(ConfigError::Missing("INPUT_IMAGE"));
        }

        let project_id = var("GOOGLE_CLOUD_PROJECT");
        let sends_requests = !matches!(mode, RunMode::DryRun | RunMode::ListScenarios);
        if sends_requests && project_id.is_none() {
            return Err(ConfigError::Missing("GOOGLE_CLOUD_PROJECT"));
        }

        Ok(Self {
            mode,
            input_dir: var("INPUT_DIR").unwrap_or_else(|| "input_images".into()).into(),
            output_dir: var("OUTPUT_DIR").unwrap_or_else(|| "generated_videos".into()).into(),
            input_image,
            custom_prompt: var("CUSTOM_PROMPT"),
            project_id,
            location: var("GOOGLE_CLOUD_LOCATION").unwrap_or_else(|| "us-central1".into()),
            generation,
            brand_prefix: var("BRAND_PREFIX").unwrap_or_else(|| "turan".into()),
            style_filter,
            selection_seed: parse_opt(&var, "SELECTION_SEED")?,
            max_in_flight,
            poller,
            scenario_catalog: var("SCENARIO_CATALOG").map(PathBuf::from),
            subject_keywords: var("SUBJECT_KEYWORDS_FILE").map(PathBuf::from),
            ledger_path: var("LEDGER_PATH")
                .unwrap_or_else(|| DEFAULT_LEDGER_FILE.into())
                .into(),
            analytics_path: var("ANALYTICS_PATH").map(PathBuf::from),
            access_token: var("GOOGLE_ACCESS_TOKEN"),
        })
    }
}

// ---- parsing helpers ----

fn core_value<T>(key: &'static str, result: Result<T, CoreError>) -> Result<T, ConfigError> {
    result.map_err(|e| ConfigError::Invalid {
        key,
        reason: e.to_string(),
    })
}

fn parse_num<T, F>(var: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    Ok(parse_opt(var, key)?.unwrap_or(default))
}

fn parse_opt<T, F>(var: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .map(|v| {
            v.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                reason: format!("'{v}': {e}"),
            })
        })
        .transpose()
}

/// Whole seconds, at least one.
fn parse_secs<F>(var: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_num(var, key, default)? {
        0 => Err(ConfigError::Invalid {
            key,
            reason: "must be at least 1 second".into(),
        }),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn parse_bool<F>(var: &F, key: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(key).map(|v| v.to_lowercase()) {
        None => Ok(default),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                reason: format!("'{v}' is not a boolean"),
            }),
        },
    }
}
