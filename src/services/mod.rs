pub mod auth;
pub mod collaborative;
pub mod comments;
pub mod content_similarity;
pub mod lists;
pub mod movies;
pub mod people;
pub mod profiles;
pub mod ratings;
pub mod recommendations;
pub mod repository;
pub mod stop_words;

pub use recommendations::RecommendationError;
pub use repository::{PgRecommendationRepository, RecommendationRepository};

/// True when `err` is a Postgres unique constraint violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}
