use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{CommentRequest, CommentView, SuccessMessage},
    services::comments,
    state::AppState,
};

pub async fn list(
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<Vec<CommentView>>> {
    Ok(Json(comments::list_comments(&state.db_pool, movie_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(movie_id): Path<i32>,
    Json(request): Json<CommentRequest>,
) -> AppResult<Json<SuccessMessage>> {
    comments::add_comment(&state.db_pool, &user, movie_id, request).await?;
    Ok(Json(SuccessMessage::new("Comment posted successfully")))
}

pub async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((movie_id, comment_id)): Path<(i32, i32)>,
    Json(request): Json<CommentRequest>,
) -> AppResult<Json<SuccessMessage>> {
    comments::edit_comment(&state.db_pool, &user, movie_id, comment_id, request).await?;
    Ok(Json(SuccessMessage::new("Comment edited successfully")))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((movie_id, comment_id)): Path<(i32, i32)>,
) -> AppResult<Json<SuccessMessage>> {
    comments::delete_comment(&state.db_pool, &user, movie_id, comment_id).await?;
    Ok(Json(SuccessMessage::new("Comment deleted successfully")))
}
