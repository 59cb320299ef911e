//! HTTP API layer: axum router, handlers, auth, and background jobs.

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod notifier;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
