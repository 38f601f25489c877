pub mod assignments;
pub mod auth;
pub mod mobile;
pub mod plannings;
pub mod teams;
pub mod users;

use axum::http::{Method, Uri};
use axum::routing::{get, post};
use axum::Router;

use crate::state::SharedState;

/// Source tag stamped on audit records, derived from the request line.
pub(crate) fn audit_source(method: &Method, uri: &Uri) -> String {
    format!("API {} {}", method, uri.path())
}

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        // Auth
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        // Account users
        .route("/api/v1/users", post(users::create))
        // Teams
        .route("/api/v1/teams", get(teams::list).post(teams::create))
        .route(
            "/api/v1/teams/{id}",
            get(teams::get)
                .put(teams::update)
                .patch(teams::update)
                .delete(teams::delete),
        )
        // Plannings
        .route(
            "/api/v1/plannings",
            get(plannings::list).post(plannings::create),
        )
        .route(
            "/api/v1/plannings/{id}",
            get(plannings::get)
                .put(plannings::update)
                .patch(plannings::update)
                .delete(plannings::delete),
        )
        // Assignments
        .route(
            "/api/v1/assignments",
            get(assignments::list).post(assignments::create),
        )
        .route(
            "/api/v1/assignments/{id}",
            get(assignments::get)
                .put(assignments::update)
                .patch(assignments::update)
                .delete(assignments::delete),
        )
        // Mobile (read-only: other methods get a 405 from the router)
        .route("/api/v1/mobile/plannings", get(mobile::list_plannings))
}
