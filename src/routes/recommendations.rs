use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{PredictedMovie, RecommendedMovie},
    services::recommendations,
    state::AppState,
};

/// Handler for content-based recommendations; public
pub async fn similar_movies(
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Vec<RecommendedMovie>>> {
    let movies = recommendations::similar_movies(state.recommendations.as_ref(), movie_id).await?;
    Ok(Json(movies))
}

/// Handler for collaborative recommendations; requires a login
pub async fn predicted_movies(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<PredictedMovie>>> {
    let movies = recommendations::predicted_movies(state.recommendations.as_ref(), user_id).await?;
    Ok(Json(movies))
}
