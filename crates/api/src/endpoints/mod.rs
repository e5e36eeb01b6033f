//! API endpoints.

mod admin;
mod auth;
mod reports;
mod tools;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/tools", tools::router())
        .nest("/reports", reports::router())
        .nest("/admin", admin::router())
}
