//! Bounded waits on external stores.
//!
//! Every session-store and relational-store call goes through [`bounded`] so
//! that an unreachable dependency surfaces as a transient
//! `DependencyUnavailable` instead of hanging the request.

use std::future::Future;
use std::time::Duration;

use tracing::error;

use crate::auth::AuthError;

/// Default timeout applied to store calls: 3 seconds.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(3);

/// Await `fut` for at most `limit`; `what` names the call in the error.
pub async fn bounded<T, F>(limit: Duration, what: &str, fut: F) -> Result<T, AuthError>
where
    F: Future<Output = Result<T, AuthError>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => {
            error!(call = what, timeout_ms = limit.as_millis() as u64, "store call timed out");
            Err(AuthError::DependencyUnavailable(format!(
                "{what} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}
