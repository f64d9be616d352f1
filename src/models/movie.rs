use serde::{Deserialize, Serialize};

/// Movie genre
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Minimal person reference embedded in movie payloads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonRef {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl PersonRef {
    /// First and last name run together, e.g. "TomHanks"
    pub fn joined_name(&self) -> String {
        format!(
            "{}{}",
            self.first_name,
            self.last_name.as_deref().unwrap_or_default()
        )
    }
}

/// Actor appearing in a movie, with the character played
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActorCredit {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub character: Option<String>,
}

impl ActorCredit {
    pub fn joined_name(&self) -> String {
        format!(
            "{}{}",
            self.first_name,
            self.last_name.as_deref().unwrap_or_default()
        )
    }
}

/// Base movie columns as stored in the `movies` table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MovieRow {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub tagline: Option<String>,
    pub runtime: Option<i32>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub overview: Option<String>,
}

/// Movie card shown on list and search pages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub runtime: Option<i32>,
    pub overview: Option<String>,
    pub genres: Vec<Genre>,
    pub directors: Vec<PersonRef>,
    pub actors: Vec<PersonRef>,
}

/// Oscar won by a movie, with the winning person when the award was personal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieOscarWin {
    pub id: i32,
    pub category: String,
    pub year: i32,
    pub ceremony: i32,
    pub person: Option<PersonRef>,
}

/// Full movie page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
    pub tagline: Option<String>,
    pub runtime: Option<i32>,
    pub budget: Option<i64>,
    pub revenue: Option<i64>,
    pub overview: Option<String>,
    pub genres: Vec<Genre>,
    pub actors: Vec<ActorCredit>,
    pub directors: Vec<PersonRef>,
    pub movie_oscar_wins: Vec<MovieOscarWin>,
}

/// Row of the global Oscar wins listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OscarWinEntry {
    pub id: i32,
    pub movie_id: i32,
    pub movie_title: String,
    pub category: String,
    pub year: i32,
    pub ceremony: i32,
}

/// Filters accepted by the search endpoint
///
/// `genre` may repeat (`?genre=1&genre=4`); a movie must carry every listed genre.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub genre: Vec<i32>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub runtime_min: Option<i32>,
    #[serde(default)]
    pub runtime_max: Option<i32>,
    #[serde(default)]
    pub page: Option<i64>,
}
