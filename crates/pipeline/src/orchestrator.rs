//! Batch orchestration: compose, submit, poll and materialize every
//! input, isolating failures per item.
//!
//! Scenario selection runs in input order before any item is
//! dispatched, so a seeded run picks the same scenarios at any
//! concurrency. Items are driven through [`futures::stream::StreamExt::buffered`],
//! which bounds the number in flight and yields outcomes in input
//! order. Analytics and ledger entries are folded from those outcomes
//! after the last item finishes.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use showreel_core::analytics::Analytics;
use showreel_core::artifact::Artifact;
use showreel_core::config::GenerationConfig;
use showreel_core::error::{CoreError, Stage};
use showreel_core::job::JobHandle;
use showreel_core::media::validate_media_type;
use showreel_core::prompt::GenerationRequest;
use showreel_core::report::{BatchReport, ResultRecord};
use showreel_core::scenario::{Scenario, ScenarioLibrary, ScenarioSelector};
use showreel_core::style::StyleFilter;
use showreel_core::subject::SubjectClassifier;
use showreel_veo::poller::{JobPoller, PollerConfig};
use showreel_veo::service::VideoService;
use showreel_veo::storage::ObjectStore;
use tokio_util::sync::CancellationToken;

use crate::export::write_report;
use crate::ledger::{LedgerEntry, ScenarioLedger};
use crate::materializer::{ArtifactNaming, Materializer};

// ---------------------------------------------------------------------------
// Settings and outcome
// ---------------------------------------------------------------------------

/// Run-level knobs that are not part of the generation request.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Prefix of every artifact name; empty for none.
    pub brand_prefix: String,
    pub style_filter: StyleFilter,
    /// Seed for scenario selection; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Items processed concurrently. `1` is fully sequential.
    pub max_in_flight: usize,
    /// Write `generation_report.json` into the destination root.
    pub write_report: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            brand_prefix: String::new(),
            style_filter: StyleFilter::default(),
            seed: None,
            max_in_flight: 1,
            write_report: true,
        }
    }
}

/// Everything a run hands back to its caller.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub report: BatchReport,
    pub analytics: Analytics,
}

/// One composed-but-not-submitted item of a dry run.
#[derive(Debug)]
pub struct PlannedItem {
    pub source: PathBuf,
    pub request: Result<GenerationRequest, CoreError>,
}

/// Result of processing one item, before folding.
struct ItemOutcome {
    record: ResultRecord,
    /// Set once the service accepted the job.
    submission: Option<(String, LedgerEntry)>,
}

impl ItemOutcome {
    fn failed(record: ResultRecord) -> Self {
        Self {
            record,
            submission: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

/// Drives a batch of source images through composition, submission,
/// polling and materialization.
///
/// Scenarios are chosen for every item in input order before any work
/// starts; items then run with at most `max_in_flight` in flight and
/// results come back in input order. Cheap to clone: the service, store
/// and library are shared.
#[derive(Clone)]
pub struct BatchOrchestrator {
    service: Arc<dyn VideoService>,
    poller: JobPoller,
    materializer: Arc<Materializer>,
    library: Arc<ScenarioLibrary>,
    classifier: SubjectClassifier,
    config: GenerationConfig,
    settings: OrchestratorSettings,
    ledger: Option<Arc<ScenarioLedger>>,
}

impl BatchOrchestrator {
    /// Orchestrator with the default poller, classifier and settings and
    /// no ledger.
    pub fn new(
        service: Arc<dyn VideoService>,
        store: Arc<dyn ObjectStore>,
        library: Arc<ScenarioLibrary>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            service,
            poller: JobPoller::default(),
            materializer: Arc::new(Materializer::new(store)),
            library,
            classifier: SubjectClassifier::default(),
            config,
            settings: OrchestratorSettings::default(),
            ledger: None,
        }
    }

    pub fn with_poller(mut self, config: PollerConfig) -> Self {
        self.poller = JobPoller::new(config);
        self
    }

    pub fn with_classifier(mut self, classifier: SubjectClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<ScenarioLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    /// Copy of this orchestrator with a different generation config,
    /// sharing service, store, catalog and ledger.
    pub fn with_config(&self, config: GenerationConfig) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Process every input and return one record per input, in input
    /// order. Never fails as a whole.
    pub async fn run(
        &self,
        inputs: &[PathBuf],
        dest_root: &Path,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        self.run_inner(inputs, None, dest_root, cancel).await
    }

    /// Process one input, optionally with a custom scene text replacing
    /// the catalog scenario.
    pub async fn run_single(
        &self,
        input: &Path,
        override_text: Option<&str>,
        dest_root: &Path,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        self.run_inner(&[input.to_path_buf()], override_text, dest_root, cancel)
            .await
    }

    /// Compose requests for every input without submitting anything.
    pub async fn plan(&self, inputs: &[PathBuf]) -> Vec<PlannedItem> {
        let scenarios = self.select_scenarios(inputs.len(), None);
        let mut planned = Vec::with_capacity(inputs.len());
        for (source, scenario) in inputs.iter().zip(scenarios) {
            let request = self.compose(source, scenario).await.and_then(|request| {
                validate_media_type(request.media_type())?;
                Ok(request)
            });
            planned.push(PlannedItem {
                source: source.clone(),
                request,
            });
        }
        planned
    }

    async fn run_inner(
        &self,
        inputs: &[PathBuf],
        override_text: Option<&str>,
        dest_root: &Path,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let max_in_flight = self.settings.max_in_flight.max(1);
        tracing::info!(
            items = inputs.len(),
            max_in_flight,
            model = self.config.model.id(),
            aspect_ratio = self.config.aspect_ratio.as_str(),
            dest = %dest_root.display(),
            "Starting batch",
        );

        let scenarios = self.select_scenarios(inputs.len(), override_text);
        let outcomes: Vec<ItemOutcome> = stream::iter(inputs.iter().zip(scenarios))
            .map(|(source, scenario)| self.process_item(source, scenario, dest_root, cancel))
            .buffered(max_in_flight)
            .collect()
            .await;

        let mut analytics = Analytics::new();
        let mut ledger_entries = Vec::new();
        let mut records = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some((key, entry)) = outcome.submission {
                analytics.record(&entry.scenario_id, self.config.enhance_prompt);
                ledger_entries.push((key, entry));
            }
            records.push(outcome.record);
        }

        if let Some(ledger) = &self.ledger {
            if !ledger_entries.is_empty() {
                if let Err(e) = ledger.merge(ledger_entries).await {
                    tracing::warn!(path = %ledger.path().display(), error = %e, "Ledger update failed");
                }
            }
        }

        let report = BatchReport::new(records);
        if self.settings.write_report {
            if let Err(e) = write_report(dest_root, &report).await {
                tracing::warn!(error = %e, "Report could not be written");
            }
        }

        tracing::info!(
            items = report.len(),
            succeeded = report.success_count(),
            failed = report.error_count(),
            "Batch finished",
        );
        BatchOutcome { report, analytics }
    }

    fn select_scenarios(&self, count: usize, override_text: Option<&str>) -> Vec<Scenario> {
        let mut selector = ScenarioSelector::new(self.settings.seed);
        (0..count)
            .map(|_| selector.select(&self.library, override_text, &self.settings.style_filter))
            .collect()
    }

    async fn compose(
        &self,
        source: &Path,
        scenario: Scenario,
    ) -> Result<GenerationRequest, CoreError> {
        self.config.validate()?;
        let bytes = tokio::fs::read(source).await?;
        let subject = self.classifier.classify(source);
        Ok(GenerationRequest::compose(
            source,
            &bytes,
            scenario,
            subject,
            &self.config,
        ))
    }

    async fn process_item(
        &self,
        source: &Path,
        scenario: Scenario,
        dest_root: &Path,
        cancel: &CancellationToken,
    ) -> ItemOutcome {
        if cancel.is_cancelled() {
            return ItemOutcome::failed(
                ResultRecord::failure(source.to_path_buf(), Stage::Cancelled, &CoreError::Cancelled)
                    .with_scenario(&scenario.id, &scenario.voiceover),
            );
        }

        let (scenario_id, voiceover) = (scenario.id.clone(), scenario.voiceover.clone());
        let request = match self.compose(source, scenario).await {
            Ok(request) => request,
            Err(e) => {
                tracing::error!(source = %source.display(), error = %e, "Composition failed");
                return ItemOutcome::failed(
                    ResultRecord::failure(source.to_path_buf(), Stage::Composition, &e)
                        .with_scenario(&scenario_id, &voiceover),
                );
            }
        };
        let scenario = request.scenario();
        let failure = |stage: Stage, error: &CoreError| {
            ResultRecord::failure(source.to_path_buf(), stage, error)
                .with_scenario(&scenario.id, &scenario.voiceover)
        };

        let mut job = match self.service.submit(&request).await {
            Ok(job) => job,
            Err(e) => {
                tracing::error!(source = %source.display(), error = %e, "Submission failed");
                return ItemOutcome::failed(failure(Stage::Submission, &e));
            }
        };
        let handle = job.handle().clone();
        let submission = Some((
            request.source_name(),
            LedgerEntry::from_request(&request, Utc::now()),
        ));

        let artifacts = match self.poller.wait(self.service.as_ref(), &mut job, cancel).await {
            Ok(artifacts) => artifacts,
            Err(e) => {
                let stage = if matches!(e, CoreError::Cancelled) {
                    Stage::Cancelled
                } else {
                    Stage::Polling
                };
                tracing::error!(
                    source = %source.display(),
                    operation = %handle,
                    error = %e,
                    "Job did not complete",
                );
                return ItemOutcome {
                    record: failure(stage, &e).with_operation(handle),
                    submission,
                };
            }
        };

        let record = self
            .materialize(&request, handle, &artifacts, dest_root)
            .await;
        ItemOutcome { record, submission }
    }

    async fn materialize(
        &self,
        request: &GenerationRequest,
        handle: JobHandle,
        artifacts: &[Artifact],
        dest_root: &Path,
    ) -> ResultRecord {
        let scenario = request.scenario();
        let source = request.source().to_path_buf();

        if artifacts.is_empty() {
            let e = CoreError::Materialization {
                index: 0,
                message: "job finished without any video".to_string(),
            };
            tracing::error!(source = %source.display(), operation = %handle, "No artifacts returned");
            return ResultRecord::failure(source, Stage::Materialization, &e)
                .with_scenario(&scenario.id, &scenario.voiceover)
                .with_operation(handle);
        }

        let stem = request.source_stem();
        let naming = ArtifactNaming {
            brand_prefix: &self.settings.brand_prefix,
            scenario_id: &scenario.id,
            source_stem: &stem,
        };
        let results = self
            .materializer
            .materialize(artifacts, &naming, dest_root)
            .await;

        let mut saved = Vec::new();
        let mut errors = Vec::new();
        for result in results {
            match result {
                Ok(path) => saved.push(path),
                Err(e) => errors.push(e),
            }
        }

        match errors.into_iter().next() {
            None => {
                tracing::info!(
                    source = %source.display(),
                    scenario_id = %scenario.id,
                    artifacts = saved.len(),
                    "Item completed",
                );
                ResultRecord::success(
                    source,
                    handle,
                    saved,
                    scenario.id.clone(),
                    scenario.voiceover.clone(),
                )
            }
            Some(first) => ResultRecord::failure(source, Stage::Materialization, &first)
                .with_scenario(&scenario.id, &scenario.voiceover)
                .with_operation(handle)
                .with_artifacts(saved),
        }
    }
}
