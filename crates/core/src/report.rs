//! Per-item outcomes and the batch report.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Stage};
use crate::job::JobHandle;

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Success,
    Error,
}

/// Where and why an item failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub stage: Stage,
    pub message: String,
}

/// Outcome of one input image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub source_image: PathBuf,
    pub operation_name: Option<JobHandle>,
    pub status: RecordStatus,
    /// Local files written for this item. May be non-empty on error when
    /// only some artifacts of a job materialized.
    pub artifacts: Vec<PathBuf>,
    pub scenario_id: Option<String>,
    pub voiceover: Option<String>,
    pub error: Option<ErrorDetail>,
}

impl ResultRecord {
    /// A successful item. Callers must pass at least one artifact path.
    pub fn success(
        source_image: PathBuf,
        operation_name: JobHandle,
        artifacts: Vec<PathBuf>,
        scenario_id: String,
        voiceover: String,
    ) -> Self {
        Self {
            source_image,
            operation_name: Some(operation_name),
            status: RecordStatus::Success,
            artifacts,
            scenario_id: Some(scenario_id),
            voiceover: Some(voiceover),
            error: None,
        }
    }

    /// A failed item with no job or scenario context yet.
    pub fn failure(source_image: PathBuf, stage: Stage, error: &CoreError) -> Self {
        Self {
            source_image,
            operation_name: None,
            status: RecordStatus::Error,
            artifacts: Vec::new(),
            scenario_id: None,
            voiceover: None,
            error: Some(ErrorDetail {
                stage,
                message: error.to_string(),
            }),
        }
    }

    pub fn with_scenario(mut self, scenario_id: &str, voiceover: &str) -> Self {
        self.scenario_id = Some(scenario_id.to_string());
        self.voiceover = Some(voiceover.to_string());
        self
    }

    pub fn with_operation(mut self, handle: JobHandle) -> Self {
        self.operation_name = Some(handle);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<PathBuf>) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }
}

// ---------------------------------------------------------------------------
// Batch report
// ---------------------------------------------------------------------------

/// One record per input, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchReport {
    records: Vec<ResultRecord>,
}

impl BatchReport {
    pub fn new(records: Vec<ResultRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ResultRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn success_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_success()).count()
    }

    pub fn error_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.iter().filter(|r| !r.is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts() {
        let report = BatchReport::new(vec![
            ResultRecord::success(
                "a.jpg".into(),
                JobHandle::new("op/1"),
                vec!["out/a_v0.mp4".into()],
                "brand_trust".into(),
                "v".into(),
            ),
            ResultRecord::failure(
                "b.gif".into(),
                Stage::Submission,
                &CoreError::Validation("gif".into()),
            ),
        ]);
        assert_eq!(report.len(), 2);
        assert_eq!(report.success_count(), 1);
        assert_eq!(report.error_count(), 1);
        assert_eq!(report.failures().count(), 1);
    }

    #[test]
    fn record_serializes_stage_and_status() {
        let record = ResultRecord::failure(
            "b.png".into(),
            Stage::Polling,
            &CoreError::Timeout {
                budget_secs: 600,
                last_transient: None,
            },
        )
        .with_scenario("custom", "line")
        .with_operation(JobHandle::new("op/7"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error"]["stage"], "polling");
        assert_eq!(value["operation_name"], "op/7");
        assert_eq!(value["scenario_id"], "custom");
    }

    #[test]
    fn report_serializes_as_array() {
        let report = BatchReport::default();
        assert_eq!(serde_json::to_string(&report).unwrap(), "[]");
    }
}
