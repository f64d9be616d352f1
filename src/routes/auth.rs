use axum::{extract::State, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    config::Config,
    error::AppResult,
    middleware::{CurrentUser, SESSION_COOKIE},
    models::{LoginRequest, RegisterRequest, SuccessMessage, UserOut},
    services::auth,
    state::AppState,
};

pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> AppResult<Json<UserOut>> {
    let user = auth::register(&state.db_pool, request).await?;
    Ok(Json(user))
}

/// Checks credentials and sets the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<LoginRequest>,
) -> AppResult<(CookieJar, Json<UserOut>)> {
    let user = auth::authenticate(&state.db_pool, &request.username, &request.password).await?;
    let token = auth::create_session(&state.cache, &user, state.config.session_ttl_secs).await?;

    let cookie = session_cookie(token, &state.config);
    Ok((jar.add(cookie), Json(UserOut::from(&user))))
}

/// HttpOnly session cookie that expires together with the Redis session
fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    let max_age = i64::try_from(config.session_ttl_secs).unwrap_or(i64::MAX);
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.session_cookie_secure)
        .max_age(time::Duration::seconds(max_age))
        .build()
}

/// Ends the session, if any, and clears the cookie
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, Json<SuccessMessage>)> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        auth::destroy_session(&state.cache, cookie.value()).await?;
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, Json(SuccessMessage::new("Logged out successfully"))))
}

pub async fn me(user: CurrentUser) -> Json<UserOut> {
    Json(UserOut {
        id: user.id,
        username: user.username,
        email: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_matches_session_ttl() {
        let config = Config {
            session_ttl_secs: 3600,
            session_cookie_secure: true,
            ..Config::default()
        };
        let cookie = session_cookie("abc123".to_string(), &config);

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc123");
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(1)));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
    }
}
