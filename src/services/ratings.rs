use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{RatingRequest, RatingView},
    services::{is_unique_violation, movies::ensure_movie_exists},
};

/// A user's rating of a movie; rating 0 when the user has not rated it
pub async fn get_rating(db_pool: &PgPool, movie_id: i32, user_id: i32) -> AppResult<RatingView> {
    let rating: Option<RatingView> = sqlx::query_as(
        "SELECT id, rating, user_id FROM ratings WHERE movie_id = $1 AND user_id = $2",
    )
    .bind(movie_id)
    .bind(user_id)
    .fetch_optional(db_pool)
    .await?;

    Ok(rating.unwrap_or(RatingView {
        id: None,
        rating: 0,
        user_id,
    }))
}

/// Rates a movie; a user may rate each movie once
pub async fn add_rating(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    request: RatingRequest,
) -> AppResult<()> {
    request.validate()?;
    ensure_movie_exists(db_pool, movie_id).await?;

    sqlx::query("INSERT INTO ratings (user_id, movie_id, rating) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(movie_id)
        .bind(request.rating)
        .execute(db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("You have already rated this movie".to_string())
            } else {
                AppError::from(e)
            }
        })?;

    tracing::info!(user_id = user.id, movie_id, rating = request.rating, "Rating submitted");
    Ok(())
}

async fn rating_owner(db_pool: &PgPool, movie_id: i32, rating_id: i32) -> AppResult<i32> {
    sqlx::query_scalar("SELECT user_id FROM ratings WHERE id = $1 AND movie_id = $2")
        .bind(rating_id)
        .bind(movie_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Rating {} not found", rating_id)))
}

pub async fn edit_rating(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    rating_id: i32,
    request: RatingRequest,
) -> AppResult<()> {
    let owner = rating_owner(db_pool, movie_id, rating_id).await?;
    user.ensure_is(owner)?;
    request.validate()?;

    sqlx::query("UPDATE ratings SET rating = $1, updated_at = NOW() WHERE id = $2")
        .bind(request.rating)
        .bind(rating_id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn delete_rating(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    rating_id: i32,
) -> AppResult<()> {
    let owner = rating_owner(db_pool, movie_id, rating_id).await?;
    user.ensure_is(owner)?;

    sqlx::query("DELETE FROM ratings WHERE id = $1")
        .bind(rating_id)
        .execute(db_pool)
        .await?;

    tracing::info!(user_id = user.id, movie_id, rating_id, "Rating deleted");
    Ok(())
}
