// @awa-component: AUTH-TokenService
//
//! Login, refresh and logout flows over the core verifier and issuer.

use chrono::Utc;
use tracing::{info, warn};
use warden_core::models::auth::{Identity, TokenPair};
use warden_core::models::permission::RoleMenuGrant;

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Verify credentials and issue a fresh token pair.
pub async fn login(state: &AppState, username: &str, password: &str) -> AppResult<TokenPair> {
    let Some(identity) = state.verifier.verify(username, password).await? else {
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };
    let pair = state.issuer.issue_pair(&identity, Utc::now()).await?;
    info!(subject = %identity.subject_id, "Login succeeded");
    Ok(pair)
}

/// Issue a fresh pair for an identity rebuilt from a validated refresh token.
pub async fn refresh(state: &AppState, identity: &Identity) -> AppResult<TokenPair> {
    let pair = state.issuer.issue_pair(identity, Utc::now()).await?;
    info!(subject = %identity.subject_id, "Tokens refreshed");
    Ok(pair)
}

/// Revoke both sessions of the caller.
pub async fn logout(state: &AppState, identity: &Identity) -> AppResult<()> {
    state.issuer.revoke_all(&identity.subject_id).await?;
    info!(subject = %identity.subject_id, "Logged out");
    Ok(())
}

/// Page-category grants for the caller's roles.
pub async fn page_permissions(state: &AppState, identity: &Identity) -> AppResult<Vec<RoleMenuGrant>> {
    let grants = state.gate.engine().page_permissions(&identity.role_ids).await?;
    if grants.is_empty() {
        warn!(subject = %identity.subject_id, "No page permissions");
    }
    Ok(grants)
}
