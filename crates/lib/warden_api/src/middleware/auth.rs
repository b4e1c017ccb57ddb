// @awa-component: AUTH-AccessControl
//
//! Authentication and CRUD authorization middleware.
//!
//! Tokens come from `Authorization: Bearer <token>`, falling back to the
//! matching auth cookie.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use warden_core::gate::GateOutcome;
use warden_core::models::auth::{Identity, TokenKind};
use warden_core::models::permission::Action;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::{ACCESS_COOKIE, REFRESH_COOKIE};

/// Validated caller, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Identity);

/// Presented token for `kind`: bearer header first, then cookie.
pub fn presented_token(headers: &HeaderMap, kind: TokenKind) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer ").or_else(|| h.strip_prefix("bearer ")))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    let cookie = match kind {
        TokenKind::Access => ACCESS_COOKIE,
        TokenKind::Refresh => REFRESH_COOKIE,
    };
    CookieJar::from_headers(headers)
        .get(cookie)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

async fn authenticate(
    state: &AppState,
    mut request: Request,
    next: Next,
    kind: TokenKind,
) -> Result<Response, AppError> {
    let token = presented_token(request.headers(), kind);
    let identity = state.gate.authenticate(token.as_deref(), kind).await??;
    request.extensions_mut().insert(AuthenticatedUser(identity));
    Ok(next.run(request).await)
}

/// Requires a valid access token; injects [`AuthenticatedUser`].
pub async fn require_access(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, request, next, TokenKind::Access).await
}

/// Requires a valid refresh token; injects [`AuthenticatedUser`].
pub async fn require_refresh(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authenticate(&state, request, next, TokenKind::Refresh).await
}

async fn guard(
    state: &AppState,
    mut request: Request,
    next: Next,
    action: Action,
) -> Result<Response, AppError> {
    let token = presented_token(request.headers(), TokenKind::Access);
    // Nested routers strip their mount prefix from `request.uri()`.
    let path = match request.extensions().get::<OriginalUri>() {
        Some(OriginalUri(uri)) => uri.path().to_string(),
        None => request.uri().path().to_string(),
    };
    match state.gate.check(token.as_deref(), action, &path).await? {
        GateOutcome::Allowed(identity) => {
            request.extensions_mut().insert(AuthenticatedUser(identity));
            Ok(next.run(request).await)
        }
        GateOutcome::Unauthenticated(rejection) => Err(rejection.into()),
        GateOutcome::Forbidden(reason) => Err(reason.into()),
    }
}

/// Access token plus Create permission on the request path.
pub async fn require_create(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, request, next, Action::Create).await
}

/// Access token plus Read permission on the request path.
pub async fn require_read(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, request, next, Action::Read).await
}

/// Access token plus Update permission on the request path.
pub async fn require_update(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, request, next, Action::Update).await
}

/// Access token plus Delete permission on the request path.
pub async fn require_delete(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    guard(&state, request, next, Action::Delete).await
}
