use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};

use crate::{
    db::CacheKey,
    error::{AppError, AppResult},
    state::AppState,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "sessionid";

/// Session payload stored in Redis under `session:<token>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: i32,
    pub username: String,
}

/// Authenticated caller, resolved from the session cookie
///
/// Using it as a handler argument makes the route require a login; requests
/// without a live session are rejected with 401.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: i32,
    pub username: String,
    pub session_token: String,
}

impl CurrentUser {
    /// Fails with 403 unless the caller is `user_id`
    pub fn ensure_is(&self, user_id: i32) -> AppResult<()> {
        if self.id == user_id {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You can only modify your own data".to_string(),
            ))
        }
    }
}

/// Session token from the request cookies, if any
pub fn session_token(parts: &Parts) -> Option<String> {
    CookieJar::from_headers(&parts.headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(parts)
            .ok_or_else(|| AppError::Unauthorized("Need to login".to_string()))?;

        let session: SessionData = state
            .cache
            .get_from_cache(&CacheKey::Session(token.clone()))
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized("Session expired, please log in again".to_string())
            })?;

        Ok(CurrentUser {
            id: session.user_id,
            username: session.username,
            session_token: token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, Request};

    fn parts_with_cookie(cookie: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header(header::COOKIE, cookie)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_session_token_from_cookie() {
        let parts = parts_with_cookie("csrftoken=abc; sessionid=4b1d");
        assert_eq!(session_token(&parts), Some("4b1d".to_string()));
    }

    #[test]
    fn test_missing_session_cookie() {
        let parts = parts_with_cookie("csrftoken=abc");
        assert_eq!(session_token(&parts), None);
    }

    #[test]
    fn test_ensure_is_owner() {
        let user = CurrentUser {
            id: 3,
            username: "critic".to_string(),
            session_token: "t".to_string(),
        };
        assert!(user.ensure_is(3).is_ok());
        assert!(matches!(user.ensure_is(4), Err(AppError::Forbidden(_))));
    }
}
