use serde::{Deserialize, Serialize};

use super::{ActorCredit, Genre, PersonRef};

/// Catalog snapshot entry consumed by the content similarity engine
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMovie {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub actors: Vec<ActorCredit>,
    pub directors: Vec<PersonRef>,
    pub genres: Vec<Genre>,
}

/// One row of the ratings relation joined with the rated movie
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct RatingRecord {
    pub user_id: i32,
    pub movie_id: i32,
    pub movie_title: String,
    pub movie_release_year: i32,
    pub rating: i32,
}

/// Rating given by a single user
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct UserRating {
    pub user_id: i32,
    pub movie_id: i32,
    pub rating: i32,
}

/// Movie similar to a target movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedMovie {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub similarity: f64,
}

/// Unrated movie with the rating a user is expected to give it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictedMovie {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub estimated_rating: f64,
}
