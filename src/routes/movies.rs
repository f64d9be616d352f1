use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{Genre, MovieDetail, MovieSummary, OscarWinEntry, Page, PageQuery, SearchQuery},
    services::movies,
    state::AppState,
};

/// Handler for the paginated movie list
pub async fn list(
    State(state): State<AppState>,
    Query(page): Query<PageQuery>,
) -> AppResult<Json<Page<MovieSummary>>> {
    let movies = movies::list_movies(&state.db_pool, &page).await?;
    Ok(Json(movies))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(movie_id): Path<i32>,
) -> AppResult<Json<MovieDetail>> {
    let movie = movies::movie_detail(
        &state.db_pool,
        &state.cache,
        state.config.detail_cache_ttl_secs,
        movie_id,
    )
    .await?;
    Ok(Json(movie))
}

pub async fn genres(State(state): State<AppState>) -> AppResult<Json<Vec<Genre>>> {
    Ok(Json(movies::list_genres(&state.db_pool).await?))
}

pub async fn genre(
    State(state): State<AppState>,
    Path(genre_id): Path<i32>,
) -> AppResult<Json<Genre>> {
    Ok(Json(movies::get_genre(&state.db_pool, genre_id).await?))
}

pub async fn oscar_wins(State(state): State<AppState>) -> AppResult<Json<Vec<OscarWinEntry>>> {
    Ok(Json(movies::list_oscar_wins(&state.db_pool).await?))
}

/// Handler for catalog search; `genre` may be repeated
pub async fn search(
    State(state): State<AppState>,
    axum_extra::extract::Query(query): axum_extra::extract::Query<SearchQuery>,
) -> AppResult<Json<Page<MovieSummary>>> {
    let results = movies::search_movies(&state.db_pool, &query).await?;
    Ok(Json(results))
}
