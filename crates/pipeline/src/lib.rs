//! Batch pipeline: turns a list of source images into materialized
//! clips, a per-item report, scenario-usage ledger entries and
//! analytics.

pub mod export;
pub mod ledger;
pub mod materializer;
pub mod orchestrator;
