//! Advisory client for the AI collaborator.
//!
//! Talks to an OpenAI-compatible chat completions endpoint to find similar
//! historical incidents and to draft report narratives. Everything here is
//! best-effort: callers treat any [`AdvisoryError`] as a degraded result,
//! never as a request failure.

mod client;
mod config;
mod report;

pub use client::{AdvisoryClient, AdvisoryError, IncidentDigest, SimilarFindings};
pub use config::AdvisoryConfig;
pub use report::{fallback_report, ReportInput};
