use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{EditProfileRequest, Profile, SuccessMessage},
    services::profiles,
    state::AppState,
};

pub async fn get(
    State(state): State<AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Profile>> {
    Ok(Json(profiles::get_profile(&state.db_pool, user_id).await?))
}

/// Owner-only profile update
pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i32>,
    Json(request): Json<EditProfileRequest>,
) -> AppResult<Json<SuccessMessage>> {
    user.ensure_is(user_id)?;
    profiles::edit_profile(&state.db_pool, &state.cache, user_id, request).await?;
    Ok(Json(SuccessMessage::new("Profile updated successfully")))
}
