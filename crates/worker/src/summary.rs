//! Human-readable console output for each run mode.

use std::fmt::Write;

use showreel_core::analytics::Analytics;
use showreel_core::report::BatchReport;
use showreel_core::scenario::ScenarioLibrary;
use showreel_pipeline::orchestrator::PlannedItem;

/// Number of scenarios listed in the usage section of a run summary.
const TOP_SCENARIOS: usize = 5;

/// Catalog listing grouped by focus.
pub fn render_scenarios(library: &ScenarioLibrary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} scenarios", library.len());
    for (focus, scenarios) in library.grouped_by_focus() {
        let _ = writeln!(out, "\n[{focus}]");
        for s in scenarios {
            let style = s
                .style
                .map(|t| format!(" ({}, {})", t.cinematic.name(), t.lighting.name()))
                .unwrap_or_default();
            let _ = writeln!(out, "  {}{style}", s.id);
            let _ = writeln!(out, "    {}", s.voiceover);
        }
    }
    out
}

/// Dry-run listing: one block per input.
pub fn render_plan(planned: &[PlannedItem]) -> String {
    let mut out = String::new();
    for item in planned {
        let _ = writeln!(out, "{}", item.source.display());
        match &item.request {
            Ok(request) => {
                let _ = writeln!(
                    out,
                    "  scenario: {} / subject: {} / {}",
                    request.scenario().id,
                    request.subject().noun(),
                    request.media_type()
                );
                let _ = writeln!(out, "  prompt: {}", request.prompt());
            }
            Err(e) => {
                let _ = writeln!(out, "  skipped: {e}");
            }
        }
    }
    out
}

/// End-of-run summary.
pub fn render_report(label: &str, report: &BatchReport, analytics: &Analytics) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{label}: {} succeeded, {} failed, {} total",
        report.success_count(),
        report.error_count(),
        report.len()
    );
    for record in report.failures() {
        if let Some(err) = &record.error {
            let _ = writeln!(
                out,
                "  {} [{}] {}",
                record.source_image.display(),
                err.stage,
                err.message
            );
        }
    }

    let top = analytics.top_scenarios(TOP_SCENARIOS);
    if !top.is_empty() {
        let _ = writeln!(out, "Scenario usage:");
        for (id, count) in top {
            let _ = writeln!(out, "  {id}: {count}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use showreel_core::error::{CoreError, Stage};
    use showreel_core::job::JobHandle;
    use showreel_core::report::ResultRecord;

    use super::*;

    #[test]
    fn scenario_listing_covers_the_catalog() {
        let library = ScenarioLibrary::builtin();
        let text = render_scenarios(&library);
        for s in library.all() {
            assert!(text.contains(&s.id), "{} missing", s.id);
        }
    }

    #[test]
    fn report_lists_failures_and_usage() {
        let report = BatchReport::new(vec![
            ResultRecord::success(
                "a.png".into(),
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
        let mut analytics = Analytics::new();
        analytics.record("brand_trust", true);

        let text = render_report("youtube", &report, &analytics);
        assert!(text.starts_with("youtube: 1 succeeded, 1 failed, 2 total"));
        assert!(text.contains("b.gif [submission]"));
        assert!(text.contains("brand_trust: 1"));
    }
}
