use chrono::{DateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CommentRequest, CommentView, TIMESTAMP_FORMAT},
    services::movies::ensure_movie_exists,
};

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i32,
    user_id: i32,
    username: String,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CommentRow> for CommentView {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            comment: row.comment,
            created_at: row.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: row.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// Comments on a movie, newest first
pub async fn list_comments(db_pool: &PgPool, movie_id: i32) -> AppResult<Vec<CommentView>> {
    let rows: Vec<CommentRow> = sqlx::query_as(
        r#"
        SELECT c.id, c.user_id, u.username, c.comment, c.created_at, c.updated_at
        FROM comments c
        JOIN users u ON u.id = c.user_id
        WHERE c.movie_id = $1
        ORDER BY c.created_at DESC, c.id DESC
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().map(CommentView::from).collect())
}

/// Author of a comment on `movie_id`, 404 if there is no such comment
async fn comment_author(db_pool: &PgPool, movie_id: i32, comment_id: i32) -> AppResult<i32> {
    sqlx::query_scalar("SELECT user_id FROM comments WHERE id = $1 AND movie_id = $2")
        .bind(comment_id)
        .bind(movie_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Comment {} not found", comment_id)))
}

pub async fn add_comment(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    request: CommentRequest,
) -> AppResult<()> {
    request.validate()?;
    ensure_movie_exists(db_pool, movie_id).await?;

    sqlx::query("INSERT INTO comments (user_id, movie_id, comment) VALUES ($1, $2, $3)")
        .bind(user.id)
        .bind(movie_id)
        .bind(&request.comment)
        .execute(db_pool)
        .await?;

    tracing::info!(user_id = user.id, movie_id, "Comment posted");
    Ok(())
}

pub async fn edit_comment(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    comment_id: i32,
    request: CommentRequest,
) -> AppResult<()> {
    let author = comment_author(db_pool, movie_id, comment_id).await?;
    user.ensure_is(author)?;
    request.validate()?;

    sqlx::query("UPDATE comments SET comment = $1, updated_at = NOW() WHERE id = $2")
        .bind(&request.comment)
        .bind(comment_id)
        .execute(db_pool)
        .await?;

    Ok(())
}

pub async fn delete_comment(
    db_pool: &PgPool,
    user: &CurrentUser,
    movie_id: i32,
    comment_id: i32,
) -> AppResult<()> {
    let author = comment_author(db_pool, movie_id, comment_id).await?;
    user.ensure_is(author)?;

    sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(comment_id)
        .execute(db_pool)
        .await?;

    tracing::info!(user_id = user.id, movie_id, comment_id, "Comment deleted");
    Ok(())
}
