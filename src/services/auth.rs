use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    middleware::SessionData,
    models::{RegisterRequest, User, UserOut},
    services::is_unique_violation,
};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Checks a candidate password, returning every rule it breaks
///
/// Rules: at least 8 characters, not entirely numeric, and must not contain
/// the username.
pub fn validate_password(password: &str, username: &str) -> Result<(), Vec<String>> {
    let mut problems = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LENGTH
        ));
    }
    if !password.is_empty() && password.chars().all(|c| c.is_ascii_digit()) {
        problems.push("This password is entirely numeric.".to_string());
    }
    if !username.is_empty() && password.to_lowercase().contains(&username.to_lowercase()) {
        problems.push("The password is too similar to the username.".to_string());
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(problems)
    }
}

/// Password rule violations as a single 400 error
pub fn check_password(password: &str, username: &str) -> AppResult<()> {
    validate_password(password, username)
        .map_err(|problems| AppError::InvalidInput(problems.join("\n")))
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub async fn find_user(db_pool: &PgPool, user_id: i32) -> AppResult<User> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
}

/// Creates an account after validating email, uniqueness and password rules
pub async fn register(db_pool: &PgPool, request: RegisterRequest) -> AppResult<UserOut> {
    request.validate()?;

    let email_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(&request.email)
            .fetch_one(db_pool)
            .await?;
    if email_taken {
        return Err(AppError::Conflict("Email already exists".to_string()));
    }

    let username_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(&request.username)
            .fetch_one(db_pool)
            .await?;
    if username_taken {
        return Err(AppError::Conflict("Username already exists".to_string()));
    }

    check_password(&request.password, &request.username)?;
    let password_hash = hash_password(&request.password)?;

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(&request.username)
    .bind(&request.email)
    .bind(&password_hash)
    .fetch_one(db_pool)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Username or email already exists".to_string())
        } else {
            AppError::from(e)
        }
    })?;

    tracing::info!(user_id = user.id, username = %user.username, "User registered");

    Ok(UserOut {
        id: user.id,
        username: user.username,
        email: Some(user.email),
    })
}

/// Looks up `username` and checks the password
pub async fn authenticate(db_pool: &PgPool, username: &str, password: &str) -> AppResult<User> {
    let invalid = || AppError::Unauthorized("Incorrect username or password".to_string());

    let user: User = sqlx::query_as("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(invalid)?;

    if !verify_password(password, &user.password_hash)? {
        tracing::warn!(username = %username, "Failed login attempt");
        return Err(invalid());
    }

    Ok(user)
}

/// Opens a session for `user` and returns its token
pub async fn create_session(cache: &Cache, user: &User, ttl: u64) -> AppResult<String> {
    let token = Uuid::new_v4().simple().to_string();
    let session = SessionData {
        user_id: user.id,
        username: user.username.clone(),
    };
    cache.set(&CacheKey::Session(token.clone()), &session, ttl).await?;
    cache.add_to_set(&CacheKey::UserSessions(user.id), &token, ttl).await?;

    tracing::info!(user_id = user.id, "Session created");
    Ok(token)
}

pub async fn destroy_session(cache: &Cache, token: &str) -> AppResult<()> {
    cache.delete(&CacheKey::Session(token.to_string())).await
}

/// Logs `user_id` out everywhere
pub async fn revoke_sessions(cache: &Cache, user_id: i32) -> AppResult<usize> {
    let tokens = cache.take_set(&CacheKey::UserSessions(user_id)).await?;
    for token in &tokens {
        destroy_session(cache, token).await?;
    }
    tracing::info!(user_id, sessions = tokens.len(), "Sessions revoked");
    Ok(tokens.len())
}
