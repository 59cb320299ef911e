pub mod health;

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/login                              login (public)
/// /auth/logout                             logout (requires auth)
///
/// /admin/users                             list, create (admin only)
/// /admin/audit-logs                        query audit logs (admin only)
///
/// /banks                                   list (auth), create (admin)
/// /banks/{id}/active                       activate/deactivate (admin)
///
/// /bank-options                            list (auth), create (admin)
/// /bank-options/{bank_id}                  get (auth), update (admin)
///
/// /incidents                               list, create
/// /incidents/search                        advanced search (audited)
/// /incidents/{id}                          get, update
/// /incidents/{id}/status                   status transition (POST)
/// /incidents/{id}/comments                 add comment (POST)
/// /incidents/{id}/timeline                 event history (GET)
/// /incidents/{id}/similar                  advisory analysis (POST), latest result (GET)
/// /incidents/{id}/corrective-actions       list, create (settled incidents only)
/// /incidents/{id}/postmortem               get, create, update (IM/admin)
///
/// /corrective-actions/{id}                 update (PUT)
///
/// /reports/incidents                       period report (IM/admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Auth.
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/logout", post(handlers::auth::logout))
        // Admin.
        .route(
            "/admin/users",
            get(handlers::auth::list_users).post(handlers::auth::create_user),
        )
        .route("/admin/audit-logs", get(handlers::audit::query_audit_logs))
        // Banks.
        .route(
            "/banks",
            get(handlers::banks::list_banks).post(handlers::banks::create_bank),
        )
        .route("/banks/{id}/active", put(handlers::banks::set_bank_active))
        // Bank technical configuration.
        .route(
            "/bank-options",
            get(handlers::bank_options::list_bank_options)
                .post(handlers::bank_options::create_bank_option),
        )
        .route(
            "/bank-options/{bank_id}",
            get(handlers::bank_options::get_bank_option)
                .put(handlers::bank_options::update_bank_option),
        )
        // Incidents.
        .route(
            "/incidents",
            get(handlers::incidents::list_incidents).post(handlers::incidents::create_incident),
        )
        .route("/incidents/search", get(handlers::incidents::search_incidents))
        .route(
            "/incidents/{id}",
            get(handlers::incidents::get_incident).put(handlers::incidents::update_incident),
        )
        .route("/incidents/{id}/status", post(handlers::incidents::change_status))
        .route("/incidents/{id}/comments", post(handlers::incidents::add_comment))
        .route("/incidents/{id}/timeline", get(handlers::incidents::get_timeline))
        .route(
            "/incidents/{id}/similar",
            get(handlers::incidents::get_latest_advice)
                .post(handlers::incidents::analyze_similar),
        )
        // Corrective actions.
        .route(
            "/incidents/{id}/corrective-actions",
            get(handlers::corrective_actions::list_actions)
                .post(handlers::corrective_actions::create_action),
        )
        .route(
            "/corrective-actions/{id}",
            put(handlers::corrective_actions::update_action),
        )
        // Postmortems.
        .route(
            "/incidents/{id}/postmortem",
            get(handlers::postmortems::get_postmortem)
                .post(handlers::postmortems::create_postmortem)
                .put(handlers::postmortems::update_postmortem),
        )
        // Reports.
        .route("/reports/incidents", get(handlers::reports::generate_report))
}
