//! Persistent record of which scenario each source image was rendered
//! with.
//!
//! The ledger is a single JSON object keyed by source filename. Each
//! merge reads the whole file, overlays the new entries (last write
//! wins) and writes the whole file back.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use showreel_core::error::CoreError;
use showreel_core::prompt::GenerationRequest;
use showreel_core::style::StyleTags;
use showreel_core::types::Timestamp;
use tokio::sync::Mutex;

/// Default ledger file name, relative to the working directory.
pub const DEFAULT_LEDGER_FILE: &str = "generated_showcase_scenarios.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleMetadata {
    pub cinematic_style: String,
    pub lighting_mood: String,
}

impl From<StyleTags> for StyleMetadata {
    fn from(tags: StyleTags) -> Self {
        Self {
            cinematic_style: tags.cinematic.name().to_string(),
            lighting_mood: tags.lighting.name().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub scenario_id: String,
    /// Focus tag of the scenario.
    pub tag: String,
    pub prompt_text: String,
    pub voiceover_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_metadata: Option<StyleMetadata>,
    pub timestamp: Timestamp,
}

impl LedgerEntry {
    pub fn from_request(request: &GenerationRequest, timestamp: Timestamp) -> Self {
        let scenario = request.scenario();
        Self {
            scenario_id: scenario.id.clone(),
            tag: scenario.focus.clone(),
            prompt_text: request.prompt().to_string(),
            voiceover_text: scenario.voiceover.clone(),
            style_metadata: scenario.style.map(StyleMetadata::from),
            timestamp,
        }
    }
}

pub type LedgerEntries = BTreeMap<String, LedgerEntry>;

/// File-backed ledger. Merges are serialized through an async mutex.
#[derive(Debug)]
pub struct ScenarioLedger {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ScenarioLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents. A missing file is an empty ledger.
    pub async fn load(&self) -> Result<LedgerEntries, CoreError> {
        read_entries(&self.path).await
    }

    /// Overlay `entries` onto the stored ledger and write it back.
    /// Returns the number of entries now stored.
    pub async fn merge(
        &self,
        entries: impl IntoIterator<Item = (String, LedgerEntry)>,
    ) -> Result<usize, CoreError> {
        let _guard = self.lock.lock().await;

        let mut stored = read_entries(&self.path).await?;
        let mut merged = 0usize;
        for (key, entry) in entries {
            stored.insert(key, entry);
            merged += 1;
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(&stored)?;
        tokio::fs::write(&self.path, json).await?;

        tracing::debug!(
            path = %self.path.display(),
            merged,
            total = stored.len(),
            "Ledger updated",
        );
        Ok(stored.len())
    }
}

async fn read_entries(path: &Path) -> Result<LedgerEntries, CoreError> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) if text.trim().is_empty() => Ok(LedgerEntries::new()),
        Ok(text) => Ok(serde_json::from_str(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(LedgerEntries::new()),
        Err(e) => Err(e.into()),
    }
}
