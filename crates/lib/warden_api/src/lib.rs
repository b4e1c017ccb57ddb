//! # warden_api
//!
//! HTTP boundary for Warden: authentication endpoints plus the access and
//! CRUD middleware a resource service layers onto its own routes.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use warden_core::auth::credentials::{CredentialStore, CredentialVerifier};
use warden_core::auth::issuer::TokenIssuer;
use warden_core::auth::validator::TokenValidator;
use warden_core::config::AuthConfig;
use warden_core::gate::AccessGate;
use warden_core::permissions::GrantSource;
use warden_core::permissions::cache::PermissionCache;
use warden_core::permissions::engine::AuthorizationEngine;
use warden_core::session::SessionStore;

use crate::handlers::{auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Token, session and cache configuration.
    pub auth: Arc<AuthConfig>,
    pub verifier: CredentialVerifier,
    pub issuer: TokenIssuer,
    pub gate: AccessGate,
    /// Also the grant-change hook for the resource service.
    pub permissions: Arc<PermissionCache>,
    pub sessions: Arc<dyn SessionStore>,
}

impl AppState {
    /// Wire the core components over the given stores.
    pub fn new(
        auth: AuthConfig,
        credentials: Arc<dyn CredentialStore>,
        grants: Arc<dyn GrantSource>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let auth = Arc::new(auth);
        let permissions = Arc::new(
            PermissionCache::new(grants)
                .with_ttl(auth.permission_cache_ttl)
                .with_timeout(auth.store_timeout),
        );
        let verifier = CredentialVerifier::new(credentials).with_timeout(auth.store_timeout);
        let issuer = TokenIssuer::new(auth.clone(), sessions.clone());
        let gate = AccessGate::new(
            TokenValidator::new(auth.clone(), sessions.clone()),
            AuthorizationEngine::new(permissions.clone()),
        );
        Self {
            auth,
            verifier,
            issuer,
            gate,
            permissions,
            sessions,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `warden_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    warden_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler))
        .route(routes::GET_API_HEALTH, get(health::health_handler));

    // Refresh-token scheme
    let refresh = Router::new()
        .route(routes::GET_AUTH_REFRESH_TOKEN, get(auth::refresh_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_refresh,
        ));

    // Access-token scheme
    let protected = Router::new()
        .route(
            routes::GET_AUTH_PAGE_PERMISSION,
            get(auth::page_permission_handler),
        )
        .route(routes::POST_AUTH_LOGOUT, post(auth::logout_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_access,
        ));

    Router::new()
        .merge(public)
        .merge(refresh)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
