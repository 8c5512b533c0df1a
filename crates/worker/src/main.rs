use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use showreel_core::analytics::Analytics;
use showreel_core::config::social_media_presets;
use showreel_core::scenario::ScenarioLibrary;
use showreel_core::subject::SubjectClassifier;
use showreel_pipeline::export::write_analytics;
use showreel_pipeline::ledger::ScenarioLedger;
use showreel_pipeline::orchestrator::{BatchOrchestrator, OrchestratorSettings};
use showreel_veo::api::VeoApi;
use showreel_veo::auth::{CredentialProvider, GcpCredentials, StaticToken};
use showreel_veo::service::VeoClient;
use showreel_veo::storage::GcsObjectStore;
use showreel_worker::config::{RunMode, WorkerConfig};
use showreel_worker::discovery::discover_images;
use showreel_worker::summary::{render_plan, render_report, render_scenarios};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "showreel_worker=info,showreel_pipeline=info,showreel_veo=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env().context("invalid configuration")?;
    tracing::info!(mode = ?config.mode, "Worker starting");

    let library = Arc::new(load_library(&config)?);
    if config.mode == RunMode::ListScenarios {
        print!("{}", render_scenarios(&library));
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight items");
            on_signal.cancel();
        }
    });

    let orchestrator = build_orchestrator(&config, library).await?;

    match config.mode {
        RunMode::DryRun => {
            let inputs = discover_images(&config.input_dir)
                .with_context(|| format!("cannot read {}", config.input_dir.display()))?;
            let planned = orchestrator.plan(&inputs).await;
            print!("{}", render_plan(&planned));
        }
        RunMode::Single => {
            let input = config
                .input_image
                .as_deref()
                .context("INPUT_IMAGE must be set in single mode")?;
            let outcome = orchestrator
                .run_single(
                    input,
                    config.custom_prompt.as_deref(),
                    &config.output_dir,
                    &cancel,
                )
                .await;
            print!("{}", render_report("single", &outcome.report, &outcome.analytics));
            export_analytics(&config, &outcome.analytics).await;
        }
        RunMode::Batch => {
            let inputs = discover_images(&config.input_dir)
                .with_context(|| format!("cannot read {}", config.input_dir.display()))?;
            let outcome = orchestrator
                .run(&inputs, &config.output_dir, &cancel)
                .await;
            print!("{}", render_report("batch", &outcome.report, &outcome.analytics));
            export_analytics(&config, &outcome.analytics).await;
        }
        RunMode::Social => {
            let inputs = discover_images(&config.input_dir)
                .with_context(|| format!("cannot read {}", config.input_dir.display()))?;
            let mut analytics = Analytics::new();
            for preset in social_media_presets(&config.generation) {
                if cancel.is_cancelled() {
                    break;
                }
                let dest = config.output_dir.join(preset.platform);
                let outcome = orchestrator
                    .with_config(preset.config)
                    .run(&inputs, &dest, &cancel)
                    .await;
                print!(
                    "{}",
                    render_report(preset.platform, &outcome.report, &outcome.analytics)
                );
                analytics.merge(&outcome.analytics);
            }
            export_analytics(&config, &analytics).await;
        }
        RunMode::ListScenarios => {}
    }

    Ok(())
}

fn load_library(config: &WorkerConfig) -> anyhow::Result<ScenarioLibrary> {
    match &config.scenario_catalog {
        Some(path) => ScenarioLibrary::from_json_file(path)
            .with_context(|| format!("cannot load scenario catalog {}", path.display())),
        None => Ok(ScenarioLibrary::builtin()),
    }
}

fn load_classifier(config: &WorkerConfig) -> anyhow::Result<SubjectClassifier> {
    match &config.subject_keywords {
        Some(path) => SubjectClassifier::from_json_file(path)
            .with_context(|| format!("cannot load subject keywords {}", path.display())),
        None => Ok(SubjectClassifier::default()),
    }
}

async fn build_orchestrator(
    config: &WorkerConfig,
    library: Arc<ScenarioLibrary>,
) -> anyhow::Result<BatchOrchestrator> {
    let credentials: Arc<dyn CredentialProvider> = match &config.access_token {
        Some(token) => Arc::new(StaticToken::new(token.clone())),
        None if config.mode == RunMode::DryRun => Arc::new(StaticToken::new(String::new())),
        None => Arc::new(
            GcpCredentials::discover()
                .await
                .context("cannot find Google Cloud credentials")?,
        ),
    };

    let project_id = config.project_id.as_deref().unwrap_or_default();
    let api = VeoApi::new(project_id, &config.location);
    let service = Arc::new(VeoClient::new(
        api,
        credentials.clone(),
        config.generation.model.id(),
    ));
    let store = Arc::new(GcsObjectStore::new(credentials));

    let settings = OrchestratorSettings {
        brand_prefix: config.brand_prefix.clone(),
        style_filter: config.style_filter,
        seed: config.selection_seed,
        max_in_flight: config.max_in_flight,
        write_report: true,
    };

    Ok(
        BatchOrchestrator::new(service, store, library, config.generation.clone())
            .with_poller(config.poller.clone())
            .with_settings(settings)
            .with_classifier(load_classifier(config)?)
            .with_ledger(Arc::new(ScenarioLedger::new(&config.ledger_path))),
    )
}

async fn export_analytics(config: &WorkerConfig, analytics: &Analytics) {
    let Some(path) = &config.analytics_path else {
        return;
    };
    if let Err(e) = write_analytics(Path::new(path), analytics).await {
        tracing::warn!(path = %path.display(), error = %e, "Analytics export failed");
    }
}
