use sqlx::PgPool;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{FilmographyEntry, Person, PersonDetail, PersonOscarWin},
};

const PERSON_COLUMNS: &str = "id, first_name, last_name, birthday, place_of_birth, biography";

pub async fn list_people(db_pool: &PgPool) -> AppResult<Vec<Person>> {
    let people = sqlx::query_as(&format!("SELECT {} FROM people ORDER BY id", PERSON_COLUMNS))
        .fetch_all(db_pool)
        .await?;
    Ok(people)
}

/// Person page with filmography and Oscar wins, served from Redis when cached
pub async fn person_detail(
    db_pool: &PgPool,
    cache: &Cache,
    ttl: u64,
    person_id: i32,
) -> AppResult<PersonDetail> {
    cached!(cache, CacheKey::PersonDetail(person_id), ttl, async {
        load_person_detail(db_pool, person_id).await
    })
}

async fn load_person_detail(db_pool: &PgPool, person_id: i32) -> AppResult<PersonDetail> {
    let person: Person = sqlx::query_as(&format!(
        "SELECT {} FROM people WHERE id = $1",
        PERSON_COLUMNS
    ))
    .bind(person_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Person {} not found", person_id)))?;

    // Acted and directed credits, deduplicated
    let filmography: Vec<FilmographyEntry> = sqlx::query_as(
        r#"
        SELECT id, title, release_year FROM (
            SELECT m.id, m.title, m.release_year
            FROM movies_actors ma
            JOIN movies m ON m.id = ma.movie_id
            WHERE ma.actor_id = $1
            UNION
            SELECT m.id, m.title, m.release_year
            FROM movies_directors md
            JOIN movies m ON m.id = md.movie_id
            WHERE md.director_id = $1
        ) credits
        ORDER BY release_year DESC, id
        "#,
    )
    .bind(person_id)
    .fetch_all(db_pool)
    .await?;

    let oscar_wins: Vec<PersonOscarWin> = sqlx::query_as(
        r#"
        SELECT w.id, w.movie_id, m.title AS movie_title, c.name AS category, w.year, w.ceremony
        FROM oscar_wins_person w
        JOIN movies m ON m.id = w.movie_id
        JOIN oscar_categories c ON c.id = w.category_id
        WHERE w.person_id = $1
        ORDER BY w.year, w.id
        "#,
    )
    .bind(person_id)
    .fetch_all(db_pool)
    .await?;

    tracing::debug!(
        person_id,
        credits = filmography.len(),
        oscar_wins = oscar_wins.len(),
        "Loaded person detail"
    );

    Ok(PersonDetail::new(person, filmography, oscar_wins))
}
