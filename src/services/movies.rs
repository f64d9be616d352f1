use std::collections::HashMap;

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{
        ActorCredit, Genre, MovieDetail, MovieOscarWin, MovieRow, MovieSummary, OscarWinEntry,
        Page, PageQuery, PersonRef, SearchQuery, PAGE_SIZE,
    },
};

const MOVIE_COLUMNS: &str =
    "m.id, m.title, m.release_year, m.tagline, m.runtime, m.budget, m.revenue, m.overview";

/// Most awarded first, then newest
const CATALOG_ORDER: &str = " ORDER BY \
    (SELECT COUNT(*) FROM oscar_wins_movie o WHERE o.movie_id = m.id) DESC, \
    m.release_year DESC, m.id";

#[derive(sqlx::FromRow)]
struct MovieGenreRow {
    movie_id: i32,
    id: i32,
    name: String,
}

#[derive(sqlx::FromRow)]
struct MoviePersonRow {
    movie_id: i32,
    id: i32,
    first_name: String,
    last_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct OscarWinRow {
    id: i32,
    category: String,
    year: i32,
    ceremony: i32,
}

#[derive(sqlx::FromRow)]
struct PersonWinRow {
    category: String,
    id: i32,
    first_name: String,
    last_name: Option<String>,
}

pub async fn list_movies(db_pool: &PgPool, page: &PageQuery) -> AppResult<Page<MovieSummary>> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM movies")
        .fetch_one(db_pool)
        .await?;

    let rows: Vec<MovieRow> = sqlx::query_as(&format!(
        "SELECT {} FROM movies m{} LIMIT $1 OFFSET $2",
        MOVIE_COLUMNS, CATALOG_ORDER
    ))
    .bind(PAGE_SIZE)
    .bind(page.offset())
    .fetch_all(db_pool)
    .await?;

    let items = summarize(db_pool, rows).await?;
    Ok(Page { items, count })
}

/// Movie page, served from Redis when cached
pub async fn movie_detail(
    db_pool: &PgPool,
    cache: &Cache,
    ttl: u64,
    movie_id: i32,
) -> AppResult<MovieDetail> {
    cached!(cache, CacheKey::MovieDetail(movie_id), ttl, async {
        load_movie_detail(db_pool, movie_id).await
    })
}

async fn load_movie_detail(db_pool: &PgPool, movie_id: i32) -> AppResult<MovieDetail> {
    let movie: MovieRow = sqlx::query_as(&format!(
        "SELECT {} FROM movies m WHERE m.id = $1",
        MOVIE_COLUMNS
    ))
    .bind(movie_id)
    .fetch_optional(db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Movie {} not found", movie_id)))?;

    let genres: Vec<Genre> = sqlx::query_as(
        r#"
        SELECT g.id, g.name
        FROM movies_genres mg
        JOIN genres g ON g.id = mg.genre_id
        WHERE mg.movie_id = $1
        ORDER BY mg.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    let actors: Vec<ActorCredit> = sqlx::query_as(
        r#"
        SELECT p.id, p.first_name, p.last_name, ma.character
        FROM movies_actors ma
        JOIN people p ON p.id = ma.actor_id
        WHERE ma.movie_id = $1
        ORDER BY ma.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    let directors: Vec<PersonRef> = sqlx::query_as(
        r#"
        SELECT p.id, p.first_name, p.last_name
        FROM movies_directors md
        JOIN people p ON p.id = md.director_id
        WHERE md.movie_id = $1
        ORDER BY md.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    let wins: Vec<OscarWinRow> = sqlx::query_as(
        r#"
        SELECT o.id, c.name AS category, o.year, o.ceremony
        FROM oscar_wins_movie o
        JOIN oscar_categories c ON c.id = o.category_id
        WHERE o.movie_id = $1
        ORDER BY o.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    let person_wins: Vec<PersonWinRow> = sqlx::query_as(
        r#"
        SELECT c.name AS category, p.id, p.first_name, p.last_name
        FROM oscar_wins_person w
        JOIN oscar_categories c ON c.id = w.category_id
        JOIN people p ON p.id = w.person_id
        WHERE w.movie_id = $1
        ORDER BY w.id
        "#,
    )
    .bind(movie_id)
    .fetch_all(db_pool)
    .await?;

    Ok(MovieDetail {
        id: movie.id,
        title: movie.title,
        release_year: movie.release_year,
        tagline: movie.tagline,
        runtime: movie.runtime,
        budget: movie.budget,
        revenue: movie.revenue,
        overview: movie.overview,
        genres,
        actors,
        directors,
        movie_oscar_wins: attach_oscar_winners(wins, &person_wins),
    })
}

/// Pairs each movie award with the first person who won in the same category
fn attach_oscar_winners(
    wins: Vec<OscarWinRow>,
    person_wins: &[PersonWinRow],
) -> Vec<MovieOscarWin> {
    wins.into_iter()
        .map(|win| {
            let person = person_wins
                .iter()
                .find(|p| p.category == win.category)
                .map(|p| PersonRef {
                    id: p.id,
                    first_name: p.first_name.clone(),
                    last_name: p.last_name.clone(),
                });
            MovieOscarWin {
                id: win.id,
                category: win.category,
                year: win.year,
                ceremony: win.ceremony,
                person,
            }
        })
        .collect()
}

/// 404 unless a movie with `movie_id` exists
pub async fn ensure_movie_exists(db_pool: &PgPool, movie_id: i32) -> AppResult<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM movies WHERE id = $1)")
        .bind(movie_id)
        .fetch_one(db_pool)
        .await?;
    if exists {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Movie {} not found", movie_id)))
    }
}

pub async fn list_genres(db_pool: &PgPool) -> AppResult<Vec<Genre>> {
    let genres = sqlx::query_as("SELECT id, name FROM genres ORDER BY id")
        .fetch_all(db_pool)
        .await?;
    Ok(genres)
}

pub async fn get_genre(db_pool: &PgPool, genre_id: i32) -> AppResult<Genre> {
    sqlx::query_as("SELECT id, name FROM genres WHERE id = $1")
        .bind(genre_id)
        .fetch_optional(db_pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", genre_id)))
}

pub async fn list_oscar_wins(db_pool: &PgPool) -> AppResult<Vec<OscarWinEntry>> {
    let wins = sqlx::query_as(
        r#"
        SELECT o.id, o.movie_id, m.title AS movie_title, c.name AS category, o.year, o.ceremony
        FROM oscar_wins_movie o
        JOIN movies m ON m.id = o.movie_id
        JOIN oscar_categories c ON c.id = o.category_id
        ORDER BY o.id
        "#,
    )
    .fetch_all(db_pool)
    .await?;
    Ok(wins)
}

/// Escapes `LIKE` wildcards and wraps the term for a substring match
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_search_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &SearchQuery) {
    if let Some(term) = query.query.as_deref().filter(|t| !t.is_empty()) {
        let pattern = like_pattern(term);
        builder
            .push(" AND (m.title ILIKE ")
            .push_bind(pattern.clone())
            .push(
                " OR EXISTS (SELECT 1 FROM movies_actors ma \
                 JOIN people p ON p.id = ma.actor_id \
                 WHERE ma.movie_id = m.id \
                 AND p.first_name || ' ' || COALESCE(p.last_name, '') ILIKE ",
            )
            .push_bind(pattern.clone())
            .push(
                ") OR EXISTS (SELECT 1 FROM movies_directors md \
                 JOIN people p ON p.id = md.director_id \
                 WHERE md.movie_id = m.id \
                 AND p.first_name || ' ' || COALESCE(p.last_name, '') ILIKE ",
            )
            .push_bind(pattern)
            .push("))");
    }

    let mut genres = query.genre.clone();
    genres.sort_unstable();
    genres.dedup();
    if !genres.is_empty() {
        let required = genres.len() as i64;
        builder
            .push(
                " AND (SELECT COUNT(DISTINCT mg.genre_id) FROM movies_genres mg \
                 WHERE mg.movie_id = m.id AND mg.genre_id = ANY(",
            )
            .push_bind(genres)
            .push(")) = ")
            .push_bind(required);
    }

    if let Some(start_year) = query.start_year {
        builder.push(" AND m.release_year >= ").push_bind(start_year);
    }
    if let Some(end_year) = query.end_year {
        builder.push(" AND m.release_year <= ").push_bind(end_year);
    }
    if let Some(runtime_min) = query.runtime_min {
        builder.push(" AND m.runtime >= ").push_bind(runtime_min);
    }
    if let Some(runtime_max) = query.runtime_max {
        builder.push(" AND m.runtime <= ").push_bind(runtime_max);
    }
}

/// Filtered, paginated catalog search
///
/// Matches the term against titles and actor or director full names; every
/// requested genre must be present; year and runtime bounds are inclusive.
pub async fn search_movies(db_pool: &PgPool, query: &SearchQuery) -> AppResult<Page<MovieSummary>> {
    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies m WHERE TRUE");
    push_search_filters(&mut count_query, query);
    let count: i64 = count_query.build_query_scalar().fetch_one(db_pool).await?;

    let mut select = QueryBuilder::<Postgres>::new(format!(
        "SELECT {} FROM movies m WHERE TRUE",
        MOVIE_COLUMNS
    ));
    push_search_filters(&mut select, query);
    select
        .push(CATALOG_ORDER)
        .push(" LIMIT ")
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(PageQuery { page: query.page }.offset());

    let rows: Vec<MovieRow> = select.build_query_as().fetch_all(db_pool).await?;

    tracing::debug!(count, returned = rows.len(), "Movie search completed");

    let items = summarize(db_pool, rows).await?;
    Ok(Page { items, count })
}

/// Movie cards for `rows`, with genres and credits attached in three batched queries
async fn summarize(db_pool: &PgPool, rows: Vec<MovieRow>) -> AppResult<Vec<MovieSummary>> {
    let ids: Vec<i32> = rows.iter().map(|m| m.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let genres: Vec<MovieGenreRow> = sqlx::query_as(
        r#"
        SELECT mg.movie_id, g.id, g.name
        FROM movies_genres mg
        JOIN genres g ON g.id = mg.genre_id
        WHERE mg.movie_id = ANY($1)
        ORDER BY mg.id
        "#,
    )
    .bind(&ids)
    .fetch_all(db_pool)
    .await?;

    let directors: Vec<MoviePersonRow> = sqlx::query_as(
        r#"
        SELECT md.movie_id, p.id, p.first_name, p.last_name
        FROM movies_directors md
        JOIN people p ON p.id = md.director_id
        WHERE md.movie_id = ANY($1)
        ORDER BY md.id
        "#,
    )
    .bind(&ids)
    .fetch_all(db_pool)
    .await?;

    let actors: Vec<MoviePersonRow> = sqlx::query_as(
        r#"
        SELECT ma.movie_id, p.id, p.first_name, p.last_name
        FROM movies_actors ma
        JOIN people p ON p.id = ma.actor_id
        WHERE ma.movie_id = ANY($1)
        ORDER BY ma.id
        "#,
    )
    .bind(&ids)
    .fetch_all(db_pool)
    .await?;

    let mut summaries: Vec<MovieSummary> = rows
        .into_iter()
        .map(|m| MovieSummary {
            id: m.id,
            title: m.title,
            release_year: m.release_year,
            runtime: m.runtime,
            overview: m.overview,
            genres: Vec::new(),
            directors: Vec::new(),
            actors: Vec::new(),
        })
        .collect();
    let index: HashMap<i32, usize> = summaries
        .iter()
        .enumerate()
        .map(|(i, m)| (m.id, i))
        .collect();

    for row in genres {
        if let Some(&i) = index.get(&row.movie_id) {
            summaries[i].genres.push(Genre {
                id: row.id,
                name: row.name,
            });
        }
    }
    for row in directors {
        if let Some(&i) = index.get(&row.movie_id) {
            summaries[i].directors.push(row.into_person());
        }
    }
    for row in actors {
        if let Some(&i) = index.get(&row.movie_id) {
            summaries[i].actors.push(row.into_person());
        }
    }

    Ok(summaries)
}

impl MoviePersonRow {
    fn into_person(self) -> PersonRef {
        PersonRef {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn win(id: i32, category: &str) -> OscarWinRow {
        OscarWinRow {
            id,
            category: category.to_string(),
            year: 1995,
            ceremony: 67,
        }
    }

    fn person_win(category: &str, id: i32, first_name: &str) -> PersonWinRow {
        PersonWinRow {
            category: category.to_string(),
            id,
            first_name: first_name.to_string(),
            last_name: None,
        }
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("hanks"), "%hanks%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }

    #[test]
    fn test_oscar_winner_matched_by_category() {
        let wins = vec![win(1, "Best Picture"), win(2, "Best Actor")];
        let people = vec![person_win("Best Actor", 31, "Tom")];

        let attached = attach_oscar_winners(wins, &people);

        assert!(attached[0].person.is_none());
        assert_eq!(attached[1].person.as_ref().map(|p| p.id), Some(31));
    }

    #[test]
    fn test_first_person_wins_when_category_shared() {
        let people = vec![
            person_win("Best Director", 5, "Joel"),
            person_win("Best Director", 6, "Ethan"),
        ];
        let attached = attach_oscar_winners(vec![win(9, "Best Director")], &people);
        assert_eq!(attached[0].person.as_ref().map(|p| p.id), Some(5));
    }

    #[test]
    fn test_search_filters_bind_each_bound() {
        let query = SearchQuery {
            query: Some("forrest".to_string()),
            genre: vec![4, 1, 4],
            start_year: Some(1990),
            end_year: Some(1999),
            runtime_min: None,
            runtime_max: Some(150),
            page: None,
        };
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies m WHERE TRUE");
        push_search_filters(&mut builder, &query);
        let sql = builder.sql();

        assert_eq!(sql.matches("ILIKE").count(), 3);
        assert!(sql.contains("ANY($4)) = $5"));
        assert!(sql.contains("m.release_year >= $6"));
        assert!(sql.contains("m.release_year <= $7"));
        assert!(sql.contains("m.runtime <= $8"));
        assert!(!sql.contains("m.runtime >="));
    }

    #[test]
    fn test_empty_search_has_no_filters() {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM movies m WHERE TRUE");
        push_search_filters(&mut builder, &SearchQuery::default());
        assert_eq!(builder.sql(), "SELECT COUNT(*) FROM movies m WHERE TRUE");
    }
}
