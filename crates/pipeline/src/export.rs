//! Report and analytics files written at the end of a run.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use showreel_core::analytics::{Analytics, AnalyticsSnapshot};
use showreel_core::error::CoreError;
use showreel_core::report::BatchReport;
use showreel_core::types::Timestamp;
use uuid::Uuid;

pub const REPORT_FILE: &str = "generation_report.json";
pub const ANALYTICS_FILE: &str = "analytics.json";

/// Overwrite `<dest_root>/generation_report.json` with `report`.
pub async fn write_report(dest_root: &Path, report: &BatchReport) -> Result<PathBuf, CoreError> {
    let path = dest_root.join(REPORT_FILE);
    write_json(&path, report).await?;
    tracing::info!(
        path = %path.display(),
        items = report.len(),
        succeeded = report.success_count(),
        failed = report.error_count(),
        "Report written",
    );
    Ok(path)
}

/// Analytics file contents: the snapshot plus run identity.
#[derive(Debug, Serialize)]
pub struct AnalyticsExport {
    pub run_id: Uuid,
    pub exported_at: Timestamp,
    #[serde(flatten)]
    pub snapshot: AnalyticsSnapshot,
}

impl AnalyticsExport {
    pub fn new(analytics: &Analytics) -> Self {
        Self {
            run_id: Uuid::now_v7(),
            exported_at: Utc::now(),
            snapshot: analytics.snapshot(),
        }
    }
}

/// Write the analytics snapshot to `path`.
pub async fn write_analytics(path: &Path, analytics: &Analytics) -> Result<(), CoreError> {
    let export = AnalyticsExport::new(analytics);
    write_json(path, &export).await?;
    tracing::info!(
        path = %path.display(),
        run_id = %export.run_id,
        submissions = export.snapshot.total_submissions,
        "Analytics exported",
    );
    Ok(())
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}
