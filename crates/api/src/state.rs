use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notifier::email::EmailNotifier;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: vigil_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Advisory client, `None` when the advisory endpoint is not configured.
    pub advisory: Option<Arc<vigil_advisory::AdvisoryClient>>,
    /// Email notifier, `None` when SMTP is not configured.
    pub notifier: Option<Arc<EmailNotifier>>,
}
