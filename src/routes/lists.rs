use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    middleware::CurrentUser,
    models::{CreateListRequest, MovieListDetail, MovieListView, SuccessMessage, UpdateListRequest},
    services::lists,
    state::AppState,
};

pub async fn for_user(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<MovieListView>>> {
    Ok(Json(lists::list_user_lists(&state.db_pool, user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<i32>,
    Json(request): Json<CreateListRequest>,
) -> AppResult<Json<SuccessMessage>> {
    lists::create_list(&state.db_pool, &user, user_id, request).await?;
    Ok(Json(SuccessMessage::new("List created successfully")))
}

pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, list_id)): Path<(i32, i32)>,
    Json(request): Json<UpdateListRequest>,
) -> AppResult<Json<SuccessMessage>> {
    lists::update_list(&state.db_pool, &user, user_id, list_id, request).await?;
    Ok(Json(SuccessMessage::new("List updated successfully")))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, list_id)): Path<(i32, i32)>,
) -> AppResult<Json<SuccessMessage>> {
    let name = lists::delete_list(&state.db_pool, &user, user_id, list_id).await?;
    Ok(Json(SuccessMessage::new(format!("List {} deleted successfully", name))))
}

pub async fn add_movie(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((user_id, list_id, movie_id)): Path<(i32, i32, i32)>,
) -> AppResult<Json<SuccessMessage>> {
    lists::add_movie(&state.db_pool, &user, user_id, list_id, movie_id).await?;
    Ok(Json(SuccessMessage::new("Movie added successfully!")))
}

pub async fn detail(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(list_id): Path<i32>,
) -> AppResult<Json<MovieListDetail>> {
    Ok(Json(lists::get_list(&state.db_pool, list_id).await?))
}

pub async fn remove_movie(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((list_id, movie_id)): Path<(i32, i32)>,
) -> AppResult<Json<SuccessMessage>> {
    let title = lists::remove_movie(&state.db_pool, &user, list_id, movie_id).await?;
    Ok(Json(SuccessMessage::new(format!("Movie {} removed successfully", title))))
}
