//! Domain types and pure logic for the product showreel generator.
//!
//! Nothing in this crate performs network I/O. The scenario library,
//! prompt composer, job state machine, report types and analytics
//! accumulator live here so the service client and the batch pipeline
//! can share them.

pub mod analytics;
pub mod artifact;
pub mod config;
pub mod error;
pub mod job;
pub mod media;
pub mod naming;
pub mod prompt;
pub mod report;
pub mod scenario;
pub mod style;
pub mod subject;
pub mod types;
