// @awa-component: AUTH-CookieTransport
//
//! Auth cookies: `access_token` and `refresh_token`.
//!
//! HttpOnly, Secure, SameSite=Strict, Path=/, expiring with their token.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use time::{Duration, OffsetDateTime};
use warden_core::models::auth::{IssuedToken, TokenPair};

use crate::error::{AppError, AppResult};

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "access_token";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

fn build(name: &str, value: String, expires: OffsetDateTime, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name.to_string(), value))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Strict)
        .path("/".to_string())
        .expires(expires)
        .max_age(max_age)
        .build()
}

/// Cookie carrying `issued`, expiring with it.
pub fn token_cookie(name: &str, issued: &IssuedToken, now: DateTime<Utc>) -> AppResult<Cookie<'static>> {
    let expires = OffsetDateTime::from_unix_timestamp(issued.expires_at.timestamp())
        .map_err(|e| AppError::Internal(format!("cookie expiry: {e}")))?;
    let max_age = Duration::seconds((issued.expires_at - now).num_seconds().max(0));
    Ok(build(name, issued.token.clone(), expires, max_age))
}

/// Add both token cookies to `jar`.
pub fn with_token_cookies(jar: CookieJar, pair: &TokenPair, now: DateTime<Utc>) -> AppResult<CookieJar> {
    Ok(jar
        .add(token_cookie(ACCESS_COOKIE, &pair.access, now)?)
        .add(token_cookie(REFRESH_COOKIE, &pair.refresh, now)?))
}

/// Overwrite both token cookies with expired blanks.
pub fn clear_token_cookies(jar: CookieJar) -> CookieJar {
    jar.add(build(ACCESS_COOKIE, String::new(), OffsetDateTime::UNIX_EPOCH, Duration::ZERO))
        .add(build(REFRESH_COOKIE, String::new(), OffsetDateTime::UNIX_EPOCH, Duration::ZERO))
}

#[cfg(test)]
mod tests {
    use chrono::TimeDelta;

    use super::*;

    #[test]
    fn token_cookie_is_locked_down() {
        let now = Utc::now();
        let issued = IssuedToken {
            token: "abc".into(),
            session_id: "s".into(),
            expires_at: now + TimeDelta::minutes(30),
        };
        let cookie = token_cookie(ACCESS_COOKIE, &issued, now).unwrap();
        assert_eq!(cookie.name(), "access_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::minutes(30)));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(issued.expires_at.timestamp())
        );
    }
}
