use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{RatingRequest, RatingView, SuccessMessage},
    services::ratings,
    state::AppState,
};

/// A user's rating of a movie, `{"rating": 0, ...}` when unrated
pub async fn get(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((movie_id, user_id)): Path<(i32, i32)>,
) -> AppResult<Json<RatingView>> {
    Ok(Json(ratings::get_rating(&state.db_pool, movie_id, user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i32>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<SuccessMessage>> {
    ratings::add_rating(&state.db_pool, &user, movie_id, request).await?;
    Ok(Json(SuccessMessage::new("Rating submitted successfully")))
}

pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((movie_id, rating_id)): Path<(i32, i32)>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<SuccessMessage>> {
    ratings::edit_rating(&state.db_pool, &user, movie_id, rating_id, request).await?;
    Ok(Json(SuccessMessage::new("Rating edited successfully")))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((movie_id, rating_id)): Path<(i32, i32)>,
) -> AppResult<Json<SuccessMessage>> {
    ratings::delete_rating(&state.db_pool, &user, movie_id, rating_id).await?;
    Ok(Json(SuccessMessage::new("Rating deleted successfully")))
}
