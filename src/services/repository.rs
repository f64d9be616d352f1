//! Data access for the recommendation engines
//!
//! The engines only ever read a full snapshot of the catalog or the ratings
//! relation. Keeping those reads behind a trait lets handlers run against
//! PostgreSQL in production and against in-memory data in tests.
use std::collections::HashMap;

use sqlx::PgPool;

use crate::{
    error::AppResult,
    models::{ActorCredit, CatalogMovie, Genre, PersonRef, RatingRecord, UserRating},
};

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationRepository: Send + Sync {
    /// Every movie with its actors, directors and genres, in catalog (id) order
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogMovie>>;

    /// Every rating in the system joined with the rated movie's title and year
    async fn fetch_all_ratings(&self) -> AppResult<Vec<RatingRecord>>;

    /// Every rating given by one user
    async fn fetch_user_ratings(&self, user_id: i32) -> AppResult<Vec<UserRating>>;
}

/// PostgreSQL-backed repository
#[derive(Clone)]
pub struct PgRecommendationRepository {
    db_pool: PgPool,
}

impl PgRecommendationRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }
}

#[derive(sqlx::FromRow)]
struct CatalogRow {
    id: i32,
    title: String,
    release_year: i32,
}

#[derive(sqlx::FromRow)]
struct ActorRow {
    movie_id: i32,
    id: i32,
    first_name: String,
    last_name: Option<String>,
    character: Option<String>,
}

#[derive(sqlx::FromRow)]
struct DirectorRow {
    movie_id: i32,
    id: i32,
    first_name: String,
    last_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct GenreRow {
    movie_id: i32,
    id: i32,
    name: String,
}

#[async_trait::async_trait]
impl RecommendationRepository for PgRecommendationRepository {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogMovie>> {
        let movies: Vec<CatalogRow> =
            sqlx::query_as("SELECT id, title, release_year FROM movies ORDER BY id")
                .fetch_all(&self.db_pool)
                .await?;

        let actors: Vec<ActorRow> = sqlx::query_as(
            r#"
            SELECT ma.movie_id, p.id, p.first_name, p.last_name, ma.character
            FROM movies_actors ma
            JOIN people p ON p.id = ma.actor_id
            ORDER BY ma.id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let directors: Vec<DirectorRow> = sqlx::query_as(
            r#"
            SELECT md.movie_id, p.id, p.first_name, p.last_name
            FROM movies_directors md
            JOIN people p ON p.id = md.director_id
            ORDER BY md.id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let genres: Vec<GenreRow> = sqlx::query_as(
            r#"
            SELECT mg.movie_id, g.id, g.name
            FROM movies_genres mg
            JOIN genres g ON g.id = mg.genre_id
            ORDER BY mg.id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        let mut catalog: Vec<CatalogMovie> = movies
            .into_iter()
            .map(|m| CatalogMovie {
                id: m.id,
                title: m.title,
                release_year: m.release_year,
                actors: Vec::new(),
                directors: Vec::new(),
                genres: Vec::new(),
            })
            .collect();
        let index: HashMap<i32, usize> = catalog
            .iter()
            .enumerate()
            .map(|(i, m)| (m.id, i))
            .collect();

        for row in actors {
            if let Some(&i) = index.get(&row.movie_id) {
                catalog[i].actors.push(ActorCredit {
                    id: row.id,
                    first_name: row.first_name,
                    last_name: row.last_name,
                    character: row.character,
                });
            }
        }
        for row in directors {
            if let Some(&i) = index.get(&row.movie_id) {
                catalog[i].directors.push(PersonRef {
                    id: row.id,
                    first_name: row.first_name,
                    last_name: row.last_name,
                });
            }
        }
        for row in genres {
            if let Some(&i) = index.get(&row.movie_id) {
                catalog[i].genres.push(Genre {
                    id: row.id,
                    name: row.name,
                });
            }
        }

        Ok(catalog)
    }

    async fn fetch_all_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        let ratings = sqlx::query_as(
            r#"
            SELECT r.user_id, r.movie_id, m.title AS movie_title,
                   m.release_year AS movie_release_year, r.rating
            FROM ratings r
            JOIN movies m ON m.id = r.movie_id
            ORDER BY r.id
            "#,
        )
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ratings)
    }

    async fn fetch_user_ratings(&self, user_id: i32) -> AppResult<Vec<UserRating>> {
        let ratings = sqlx::query_as(
            "SELECT user_id, movie_id, rating FROM ratings WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.db_pool)
        .await?;

        Ok(ratings)
    }
}
