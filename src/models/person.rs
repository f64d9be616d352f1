use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Person as listed on the people index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Person {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub biography: Option<String>,
}

/// Movie a person acted in or directed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FilmographyEntry {
    pub id: i32,
    pub title: String,
    pub release_year: i32,
}

/// Oscar won by a person for a given movie
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PersonOscarWin {
    pub id: i32,
    pub movie_id: i32,
    pub movie_title: String,
    pub category: String,
    pub year: i32,
    pub ceremony: i32,
}

/// Full person page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonDetail {
    pub id: i32,
    pub first_name: String,
    pub last_name: Option<String>,
    pub birthday: Option<NaiveDate>,
    pub place_of_birth: Option<String>,
    pub biography: Option<String>,
    pub filmography: Vec<FilmographyEntry>,
    pub oscar_wins: Vec<PersonOscarWin>,
}

impl PersonDetail {
    pub fn new(
        person: Person,
        filmography: Vec<FilmographyEntry>,
        oscar_wins: Vec<PersonOscarWin>,
    ) -> Self {
        Self {
            id: person.id,
            first_name: person.first_name,
            last_name: person.last_name,
            birthday: person.birthday,
            place_of_birth: person.place_of_birth,
            biography: person.biography,
            filmography,
            oscar_wins,
        }
    }
}
