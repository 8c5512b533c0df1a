//! Per-run usage analytics.
//!
//! An [`Analytics`] value is owned by whoever runs the batch and handed
//! back with the report. It only ever grows.

use std::collections::HashMap;

use serde::Serialize;

/// Counters for one orchestrator run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analytics {
    total_submissions: u64,
    enhanced: u64,
    baseline: u64,
    scenario_counts: HashMap<String, u64>,
}

/// One row of the ranked scenario view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioUsage {
    pub scenario_id: String,
    pub count: u64,
    pub percent: f64,
}

/// Exportable snapshot of an [`Analytics`] value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsSnapshot {
    pub total_submissions: u64,
    pub enhanced_prompts: u64,
    pub baseline_prompts: u64,
    pub enhanced_percent: f64,
    pub baseline_percent: f64,
    pub scenario_usage: Vec<ScenarioUsage>,
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 1000.0).round() / 10.0
    }
}

impl Analytics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one submission of `scenario_id`. `enhanced` tells whether
    /// the service-side prompt enhancement was requested.
    pub fn record(&mut self, scenario_id: &str, enhanced: bool) {
        self.total_submissions += 1;
        if enhanced {
            self.enhanced += 1;
        } else {
            self.baseline += 1;
        }
        *self
            .scenario_counts
            .entry(scenario_id.to_string())
            .or_insert(0) += 1;
    }

    /// Add another run's counters to this one.
    pub fn merge(&mut self, other: &Analytics) {
        self.total_submissions += other.total_submissions;
        self.enhanced += other.enhanced;
        self.baseline += other.baseline;
        for (id, count) in &other.scenario_counts {
            *self.scenario_counts.entry(id.clone()).or_insert(0) += count;
        }
    }

    pub fn total_submissions(&self) -> u64 {
        self.total_submissions
    }

    pub fn enhanced(&self) -> u64 {
        self.enhanced
    }

    pub fn baseline(&self) -> u64 {
        self.baseline
    }

    pub fn count_for(&self, scenario_id: &str) -> u64 {
        self.scenario_counts.get(scenario_id).copied().unwrap_or(0)
    }

    /// The `n` most used scenarios, most used first, ties by id.
    pub fn top_scenarios(&self, n: usize) -> Vec<(&str, u64)> {
        let mut ranked: Vec<(&str, u64)> = self
            .scenario_counts
            .iter()
            .map(|(id, count)| (id.as_str(), *count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(n);
        ranked
    }

    pub fn snapshot(&self) -> AnalyticsSnapshot {
        let total = self.total_submissions;
        AnalyticsSnapshot {
            total_submissions: total,
            enhanced_prompts: self.enhanced,
            baseline_prompts: self.baseline,
            enhanced_percent: percent(self.enhanced, total),
            baseline_percent: percent(self.baseline, total),
            scenario_usage: self
                .top_scenarios(self.scenario_counts.len())
                .into_iter()
                .map(|(id, count)| ScenarioUsage {
                    scenario_id: id.to_string(),
                    count,
                    percent: percent(count, total),
                })
                .collect(),
        }
    }
}
