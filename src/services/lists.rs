use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{
        CreateListRequest, Genre, ListedMovie, MovieListDetail, MovieListView, UpdateListRequest,
        UserOut, TIMESTAMP_FORMAT,
    },
    services::{auth, is_unique_violation, movies::ensure_movie_exists},
};

#[derive(sqlx::FromRow)]
struct ListRow {
    id: i32,
    name: String,
    description: Option<String>,
    user_id: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ListRow> for MovieListView {
    fn from(row: ListRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at.format(TIMESTAMP_FORMAT).to_string(),
            updated_at: row.updated_at.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ListedMovieRow {
    id: i32,
    title: String,
    release_year: i32,
    runtime: Option<i32>,
    overview: Option<String>,
}

#[derive(sqlx::FromRow)]
struct ListedGenreRow {
    movie_id: i32,
    id: i32,
    name: String,
}

const LIST_COLUMNS: &str = "id, name, description, user_id, created_at, updated_at";

async fn find_list(db_pool: &PgPool, list_id: i32) -> AppResult<ListRow> {
    sqlx::query_as(&format!(
        "SELECT {} FROM movie_lists WHERE id = $1",
        LIST_COLUMNS
    ))
    .bind(list_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("List {} not found", list_id)))
}

/// Loads a list of `owner_id` that the caller may modify
async fn owned_list(
    db_pool: &PgPool,
    user: &CurrentUser,
    owner_id: i32,
    list_id: i32,
) -> AppResult<ListRow> {
    user.ensure_is(owner_id)?;
    let list = find_list(db_pool, list_id).await?;
    if list.user_id != owner_id {
        return Err(AppError::NotFound(format!("List {} not found", list_id)));
    }
    Ok(list)
}

pub async fn list_user_lists(db_pool: &PgPool, user_id: i32) -> AppResult<Vec<MovieListView>> {
    auth::find_user(db_pool, user_id).await?;

    let rows: Vec<ListRow> = sqlx::query_as(&format!(
        "SELECT {} FROM movie_lists WHERE user_id = $1 ORDER BY id",
        LIST_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(db_pool)
    .await?;

    Ok(rows.into_iter().map(MovieListView::from).collect())
}

pub async fn create_list(
    db_pool: &PgPool,
    user: &CurrentUser,
    owner_id: i32,
    request: CreateListRequest,
) -> AppResult<()> {
    user.ensure_is(owner_id)?;
    request.validate()?;

    let list_id: i32 = sqlx::query_scalar(
        "INSERT INTO movie_lists (name, description, user_id) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(&request.name)
    .bind(&request.description)
    .bind(owner_id)
    .fetch_one(db_pool)
    .await?;

    tracing::info!(user_id = owner_id, list_id, "Movie list created");
    Ok(())
}

/// Renames or re-describes a list; blank fields are left unchanged
pub async fn update_list(
    db_pool: &PgPool,
    user: &CurrentUser,
    owner_id: i32,
    list_id: i32,
    request: UpdateListRequest,
) -> AppResult<()> {
    request.validate()?;
    let mut list = owned_list(db_pool, user, owner_id, list_id).await?;

    if let Some(name) = request.name.filter(|n| !n.is_empty()) {
        list.name = name;
    }
    if let Some(description) = request.description.filter(|d| !d.is_empty()) {
        list.description = Some(description);
    }

    sqlx::query(
        "UPDATE movie_lists SET name = $1, description = $2, updated_at = NOW() WHERE id = $3",
    )
    .bind(&list.name)
    .bind(&list.description)
    .bind(list_id)
    .execute(db_pool)
    .await?;

    Ok(())
}

/// Deletes a list and returns its name
pub async fn delete_list(
    db_pool: &PgPool,
    user: &CurrentUser,
    owner_id: i32,
    list_id: i32,
) -> AppResult<String> {
    let list = owned_list(db_pool, user, owner_id, list_id).await?;

    sqlx::query("DELETE FROM movie_lists WHERE id = $1")
        .bind(list_id)
        .execute(db_pool)
        .await?;

    tracing::info!(user_id = owner_id, list_id, "Movie list deleted");
    Ok(list.name)
}

pub async fn add_movie(
    db_pool: &PgPool,
    user: &CurrentUser,
    owner_id: i32,
    list_id: i32,
    movie_id: i32,
) -> AppResult<()> {
    owned_list(db_pool, user, owner_id, list_id).await?;
    ensure_movie_exists(db_pool, movie_id).await?;

    let duplicate = || AppError::InvalidInput("Movie already exists in the list!".to_string());

    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM movie_list_movies WHERE movie_list_id = $1 AND movie_id = $2)",
    )
    .bind(list_id)
    .bind(movie_id)
    .fetch_one(db_pool)
    .await?;
    if exists {
        return Err(duplicate());
    }

    sqlx::query("INSERT INTO movie_list_movies (movie_list_id, movie_id) VALUES ($1, $2)")
        .bind(list_id)
        .bind(movie_id)
        .execute(db_pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                duplicate()
            } else {
                AppError::from(e)
            }
        })?;

    Ok(())
}

/// Removes a movie from a list and returns the movie title
pub async fn remove_movie(
    db_pool: &PgPool,
    user: &CurrentUser,
    list_id: i32,
    movie_id: i32,
) -> AppResult<String> {
    let list = find_list(db_pool, list_id).await?;
    user.ensure_is(list.user_id)?;

    let title: String = sqlx::query_scalar(
        r#"
        DELETE FROM movie_list_movies lm
        USING movies m
        WHERE lm.movie_list_id = $1 AND lm.movie_id = $2 AND m.id = lm.movie_id
        RETURNING m.title
        "#,
    )
    .bind(list_id)
    .bind(movie_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Movie {} is not in list {}", movie_id, list_id)))?;

    Ok(title)
}

/// A list with its owner and movies, in the order they were added
pub async fn get_list(db_pool: &PgPool, list_id: i32) -> AppResult<MovieListDetail> {
    let list = find_list(db_pool, list_id).await?;
    let owner = auth::find_user(db_pool, list.user_id).await?;

    let movies: Vec<ListedMovieRow> = sqlx::query_as(
        r#"
        SELECT m.id, m.title, m.release_year, m.runtime, m.overview
        FROM movie_list_movies lm
        JOIN movies m ON m.id = lm.movie_id
        WHERE lm.movie_list_id = $1
        ORDER BY lm.id
        "#,
    )
    .bind(list_id)
    .fetch_all(db_pool)
    .await?;

    let genres: Vec<ListedGenreRow> = sqlx::query_as(
        r#"
        SELECT mg.movie_id, g.id, g.name
        FROM movie_list_movies lm
        JOIN movies_genres mg ON mg.movie_id = lm.movie_id
        JOIN genres g ON g.id = mg.genre_id
        WHERE lm.movie_list_id = $1
        ORDER BY mg.id
        "#,
    )
    .bind(list_id)
    .fetch_all(db_pool)
    .await?;

    let mut genres_by_movie: HashMap<i32, Vec<Genre>> = HashMap::new();
    for row in genres {
        genres_by_movie.entry(row.movie_id).or_default().push(Genre {
            id: row.id,
            name: row.name,
        });
    }

    let movies = movies
        .into_iter()
        .map(|m| ListedMovie {
            genres: genres_by_movie.remove(&m.id).unwrap_or_default(),
            id: m.id,
            title: m.title,
            release_year: m.release_year,
            runtime: m.runtime,
            overview: m.overview,
        })
        .collect();

    Ok(MovieListDetail {
        id: list.id,
        user: UserOut::from(&owner),
        name: list.name,
        description: list.description,
        movies,
    })
}
