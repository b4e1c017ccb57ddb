// @awa-component: AUTH-LoginEndpoint
// @awa-component: AUTH-TokenRefreshEndpoint
//
//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use warden_core::models::permission::RoleMenuGrant;

use crate::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{LoginRequest, LogoutResponse, TokenResponse};
use crate::services::{auth, cookies};

/// `POST /api/system/authentication/login`
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let Json(body) = body.map_err(|e| AppError::Validation(e.body_text()))?;
    let pair = auth::login(&state, &body.username, &body.password).await?;
    let jar = cookies::with_token_cookies(jar, &pair, Utc::now())?;
    Ok((jar, Json(TokenResponse::from(&pair))))
}

/// `GET /api/system/authentication/refresh-token`, behind `require_refresh`.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<TokenResponse>)> {
    let pair = auth::refresh(&state, &identity).await?;
    let jar = cookies::with_token_cookies(jar, &pair, Utc::now())?;
    Ok((jar, Json(TokenResponse::from(&pair))))
}

/// `GET /api/system/authentication/page-permission`
pub async fn page_permission_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
) -> AppResult<Json<Vec<RoleMenuGrant>>> {
    Ok(Json(auth::page_permissions(&state, &identity).await?))
}

/// `POST /api/system/authentication/logout`
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(identity)): Extension<AuthenticatedUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<LogoutResponse>)> {
    auth::logout(&state, &identity).await?;
    Ok((
        cookies::clear_token_cookies(jar),
        Json(LogoutResponse { success: true }),
    ))
}
