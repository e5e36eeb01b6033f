//! API middleware.

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use toolyard_core::{CleanupService, LifecycleService, ReportService, ToolService, UserService};

/// Session cookie carrying the auth token.
pub const SESSION_COOKIE: &str = "toolyard_session";

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// User service
    pub user_service: UserService,
    /// Tool service
    pub tool_service: ToolService,
    /// Report service
    pub report_service: ReportService,
    /// Lifecycle service
    pub lifecycle_service: LifecycleService,
    /// Cleanup service
    pub cleanup_service: CleanupService,
}

/// Authentication middleware.
///
/// Resolves the caller from a bearer token or the session cookie and
/// stashes the account in the request extensions for the extractors.
/// Requests without a valid token pass through unauthenticated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = request_token(req.headers())
        && let Ok(user) = state.user_service.authenticate_by_token(&token).await
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}

fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(ToString::to_string);

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_string())
    })
}
