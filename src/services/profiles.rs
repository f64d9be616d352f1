use sqlx::PgPool;
use validator::Validate;

use crate::{
    db::Cache,
    error::{AppError, AppResult},
    models::{EditProfileRequest, Profile},
    services::auth,
};

pub async fn get_profile(db_pool: &PgPool, user_id: i32) -> AppResult<Profile> {
    let user = auth::find_user(db_pool, user_id).await?;
    Ok(Profile::from(user))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Decides whether `request` changes the password, returning the new plain-text password
///
/// A change needs the current password, a matching repeat, and must pass the
/// password rules.
fn requested_password_change<'a>(
    request: &'a EditProfileRequest,
    password_hash: &str,
    username: &str,
) -> AppResult<Option<&'a str>> {
    let Some(new_password) = non_empty(&request.new_password) else {
        if non_empty(&request.new_password_repeat).is_some() {
            return Err(AppError::InvalidInput(
                "Please provide both new password and current password.".to_string(),
            ));
        }
        return Ok(None);
    };

    let current_password = non_empty(&request.current_password).ok_or_else(|| {
        AppError::InvalidInput("Please provide your current password.".to_string())
    })?;
    if !auth::verify_password(current_password, password_hash)? {
        return Err(AppError::InvalidInput(
            "Existing password is incorrect.".to_string(),
        ));
    }
    if Some(new_password) != request.new_password_repeat.as_deref() {
        return Err(AppError::InvalidInput("Passwords do not match.".to_string()));
    }
    auth::check_password(new_password, username)?;

    Ok(Some(new_password))
}

/// Updates names, bio and optionally the password; blank fields are left unchanged
///
/// A password change ends every session of the user.
pub async fn edit_profile(
    db_pool: &PgPool,
    cache: &Cache,
    user_id: i32,
    request: EditProfileRequest,
) -> AppResult<()> {
    request.validate()?;

    let mut user = auth::find_user(db_pool, user_id).await?;

    if let Some(first_name) = non_empty(&request.first_name) {
        user.first_name = first_name.to_string();
    }
    if let Some(last_name) = non_empty(&request.last_name) {
        user.last_name = last_name.to_string();
    }
    let new_password = requested_password_change(&request, &user.password_hash, &user.username)?;
    if let Some(new_password) = new_password {
        user.password_hash = auth::hash_password(new_password)?;
    }
    if let Some(bio) = non_empty(&request.bio) {
        user.bio = Some(bio.to_string());
    }

    sqlx::query(
        r#"
        UPDATE users
        SET first_name = $1, last_name = $2, password_hash = $3, bio = $4
        WHERE id = $5
        "#,
    )
    .bind(&user.first_name)
    .bind(&user.last_name)
    .bind(&user.password_hash)
    .bind(&user.bio)
    .bind(user_id)
    .execute(db_pool)
    .await?;

    if new_password.is_some() {
        tracing::info!(user_id, "Password changed");
        auth::revoke_sessions(cache, user_id).await?;
    }

    Ok(())
}
