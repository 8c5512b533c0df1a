//! Command-line worker: environment configuration, input discovery and
//! the run modes built on top of the batch pipeline.

pub mod config;
pub mod discovery;
pub mod summary;
