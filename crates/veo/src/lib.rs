//! Vertex AI Veo client library.
//!
//! Provides the REST wrapper for long-running video generation
//! (`predictLongRunning` / `fetchPredictOperation`), typed wire
//! messages, bearer-token providers, a Cloud Storage object store for
//! remote artifacts, and the clock-driven job poller.

pub mod api;
pub mod auth;
pub mod messages;
pub mod poller;
pub mod service;
pub mod storage;
