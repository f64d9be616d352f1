use axum::http::StatusCode;
use std::time::Instant;

use crate::{
    error::AppResult,
    models::{PredictedMovie, RecommendedMovie},
    services::{collaborative, content_similarity, repository::RecommendationRepository},
};

/// Conditions under which no recommendation can be produced
///
/// Each is checked before any numeric work starts and maps to its own
/// client-facing response.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("Movie {0} not found")]
    TargetNotFound(i32),

    #[error("Ratings not found")]
    NoRatingsData,

    #[error("User ratings not found. Rate movies in order to get recommendations")]
    UserHasNoRatings(i32),

    #[error("Recommendation is not possible")]
    NoCandidates,
}

impl RecommendationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RecommendationError::TargetNotFound(_)
            | RecommendationError::NoRatingsData
            | RecommendationError::UserHasNoRatings(_) => StatusCode::NOT_FOUND,
            RecommendationError::NoCandidates => StatusCode::BAD_REQUEST,
        }
    }
}

/// Movies most similar to `movie_id` by cast, crew and genre
///
/// Reads a fresh catalog snapshot on every call.
pub async fn similar_movies(
    repository: &dyn RecommendationRepository,
    movie_id: i32,
) -> AppResult<Vec<RecommendedMovie>> {
    let start = Instant::now();
    let catalog = repository.fetch_catalog().await?;

    let recommendations = content_similarity::similar_movies(&catalog, movie_id)?;

    tracing::info!(
        movie_id,
        catalog_size = catalog.len(),
        returned = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Content recommendations computed"
    );

    Ok(recommendations)
}

/// Unrated movies `user_id` is predicted to like, from similar users' ratings
pub async fn predicted_movies(
    repository: &dyn RecommendationRepository,
    user_id: i32,
) -> AppResult<Vec<PredictedMovie>> {
    let start = Instant::now();
    let all_ratings = repository.fetch_all_ratings().await?;
    if all_ratings.is_empty() {
        return Err(RecommendationError::NoRatingsData.into());
    }
    let user_ratings = repository.fetch_user_ratings(user_id).await?;

    let predictions = collaborative::predicted_movies(&all_ratings, &user_ratings, user_id)?;

    tracing::info!(
        user_id,
        ratings = all_ratings.len(),
        returned = predictions.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Collaborative recommendations computed"
    );

    Ok(predictions)
}
