//! Loads the catalog CSV files into PostgreSQL
//!
//! ```text
//! seed <model> <csv path>
//! seed all [data dir]
//! ```
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use serde::{de::DeserializeOwned, Deserialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moviebase_api::{
    config::Config,
    db::{create_pool, run_migrations},
};

const DEFAULT_DATA_DIR: &str = "data";

/// Load order for `seed all`; referenced tables come first
const SEED_ORDER: [(Model, &str); 9] = [
    (Model::Movie, "movies.csv"),
    (Model::Genre, "genres.csv"),
    (Model::MoviesGenres, "movies_genres.csv"),
    (Model::OscarCategories, "oscar_categories.csv"),
    (Model::OscarWinsMovie, "oscar_wins_movies.csv"),
    (Model::People, "people.csv"),
    (Model::MoviesActors, "movies_actors.csv"),
    (Model::MoviesDirectors, "movies_directors.csv"),
    (Model::OscarWinsPerson, "oscar_wins_people.csv"),
];

/// Tables with explicit ids whose sequences must be moved past the seeded rows
const SEQUENCE_TABLES: [&str; 9] = [
    "movies",
    "genres",
    "movies_genres",
    "oscar_categories",
    "oscar_wins_movie",
    "people",
    "movies_actors",
    "movies_directors",
    "oscar_wins_person",
];

/// Loads the catalog CSV files into PostgreSQL
#[derive(Debug, Parser)]
#[command(name = "seed", args_conflicts_with_subcommands = true)]
struct Cli {
    /// Table to load
    #[arg(value_enum, requires = "path")]
    model: Option<Model>,

    /// CSV file for the table
    path: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Load every catalog file, referenced tables first
    All {
        /// Directory holding the CSV files
        #[arg(default_value = DEFAULT_DATA_DIR)]
        dir: PathBuf,
    },
}

impl Cli {
    /// Seeding jobs for the parsed command line
    fn jobs(self) -> anyhow::Result<Vec<(Model, PathBuf)>> {
        match (self.command, self.model, self.path) {
            (Some(Command::All { dir }), _, _) => Ok(SEED_ORDER
                .iter()
                .map(|(model, file)| (*model, dir.join(file)))
                .collect()),
            (None, Some(model), Some(path)) => Ok(vec![(model, path)]),
            _ => anyhow::bail!("usage: seed <model> <csv path> | seed all [data dir]"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Model {
    Movie,
    Genre,
    MoviesGenres,
    OscarCategories,
    OscarWinsMovie,
    People,
    MoviesActors,
    MoviesDirectors,
    OscarWinsPerson,
}

#[derive(Debug, Deserialize)]
struct MovieCsv {
    movie_id: i32,
    year: i32,
    title: String,
    tagline: Option<String>,
    runtime: Option<i32>,
    budget: Option<i64>,
    revenue: Option<i64>,
    overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenreCsv {
    genre_id: i32,
    genre: String,
}

#[derive(Debug, Deserialize)]
struct MovieGenreCsv {
    movie_id: i32,
    genre_id: i32,
}

#[derive(Debug, Deserialize)]
struct OscarCategoryCsv {
    category_id: i32,
    category_name: String,
}

#[derive(Debug, Deserialize)]
struct OscarWinMovieCsv {
    movie_id: i32,
    category_id: i32,
    year_ceremony: i32,
    ceremony: i32,
}

#[derive(Debug, Deserialize)]
struct PersonCsv {
    person_id: i32,
    first_name: String,
    last_name: Option<String>,
    birthday: Option<NaiveDate>,
    place_of_birth: Option<String>,
    biography: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieActorCsv {
    movie_id: i32,
    actor_id: i32,
    character: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDirectorCsv {
    movie_id: i32,
    director_id: i32,
}

#[derive(Debug, Deserialize)]
struct OscarWinPersonCsv {
    person_id: i32,
    movie_id: i32,
    category_id: i32,
    year_ceremony: i32,
    ceremony: i32,
}

fn parse_rows<T: DeserializeOwned, R: std::io::Read>(reader: R) -> anyhow::Result<Vec<T>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for (line, record) in reader.deserialize().enumerate() {
        // header is line 1
        rows.push(record.with_context(|| format!("invalid record on line {}", line + 2))?);
    }
    Ok(rows)
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> anyhow::Result<Vec<T>> {
    let file =
        std::fs::File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    parse_rows(file).with_context(|| format!("cannot parse {}", path.display()))
}

async fn seed_model(
    tx: &mut Transaction<'_, Postgres>,
    model: Model,
    path: &Path,
) -> anyhow::Result<usize> {
    let count = match model {
        Model::Movie => {
            let rows: Vec<MovieCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    r#"
                    INSERT INTO movies
                        (id, release_year, title, tagline, runtime, budget, revenue, overview)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(row.movie_id)
                .bind(row.year)
                .bind(&row.title)
                .bind(&row.tagline)
                .bind(row.runtime)
                .bind(row.budget)
                .bind(row.revenue)
                .bind(&row.overview)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::Genre => {
            let rows: Vec<GenreCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    "INSERT INTO genres (id, name) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING",
                )
                .bind(row.genre_id)
                .bind(&row.genre)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::MoviesGenres => {
            let rows: Vec<MovieGenreCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query("INSERT INTO movies_genres (movie_id, genre_id) VALUES ($1, $2)")
                    .bind(row.movie_id)
                    .bind(row.genre_id)
                    .execute(&mut **tx)
                    .await?;
            }
            rows.len()
        }
        Model::OscarCategories => {
            let rows: Vec<OscarCategoryCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    r#"
                    INSERT INTO oscar_categories (id, name) VALUES ($1, $2)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(row.category_id)
                .bind(&row.category_name)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::OscarWinsMovie => {
            let rows: Vec<OscarWinMovieCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    r#"
                    INSERT INTO oscar_wins_movie (movie_id, category_id, year, ceremony)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(row.movie_id)
                .bind(row.category_id)
                .bind(row.year_ceremony)
                .bind(row.ceremony)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::People => {
            let rows: Vec<PersonCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    r#"
                    INSERT INTO people
                        (id, first_name, last_name, birthday, place_of_birth, biography)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ON CONFLICT (id) DO NOTHING
                    "#,
                )
                .bind(row.person_id)
                .bind(&row.first_name)
                .bind(&row.last_name)
                .bind(row.birthday)
                .bind(&row.place_of_birth)
                .bind(&row.biography)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::MoviesActors => {
            let rows: Vec<MovieActorCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    "INSERT INTO movies_actors (movie_id, actor_id, character) VALUES ($1, $2, $3)",
                )
                .bind(row.movie_id)
                .bind(row.actor_id)
                .bind(&row.character)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
        Model::MoviesDirectors => {
            let rows: Vec<MovieDirectorCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query("INSERT INTO movies_directors (movie_id, director_id) VALUES ($1, $2)")
                    .bind(row.movie_id)
                    .bind(row.director_id)
                    .execute(&mut **tx)
                    .await?;
            }
            rows.len()
        }
        Model::OscarWinsPerson => {
            let rows: Vec<OscarWinPersonCsv> = read_rows(path)?;
            for row in &rows {
                sqlx::query(
                    r#"
                    INSERT INTO oscar_wins_person (person_id, movie_id, category_id, year, ceremony)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(row.person_id)
                .bind(row.movie_id)
                .bind(row.category_id)
                .bind(row.year_ceremony)
                .bind(row.ceremony)
                .execute(&mut **tx)
                .await?;
            }
            rows.len()
        }
    };

    tracing::info!(model = ?model, rows = count, path = %path.display(), "Seeded");
    Ok(count)
}

async fn reset_sequences(tx: &mut Transaction<'_, Postgres>) -> anyhow::Result<()> {
    for table in SEQUENCE_TABLES {
        sqlx::query(&format!(
            "SELECT setval(pg_get_serial_sequence('{table}', 'id'), \
             COALESCE((SELECT MAX(id) FROM {table}), 0) + 1, false)"
        ))
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

async fn seed(db_pool: &PgPool, jobs: &[(Model, PathBuf)]) -> anyhow::Result<()> {
    let mut tx = db_pool.begin().await?;
    for (model, path) in jobs {
        seed_model(&mut tx, *model, path).await?;
    }
    reset_sequences(&mut tx).await?;
    tx.commit().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed=info,moviebase_api=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let jobs = Cli::parse().jobs()?;

    let config = Config::from_env()?;
    let db_pool = create_pool(&config.database_url, config.db_max_connections).await?;
    run_migrations(&db_pool).await?;

    seed(&db_pool, &jobs).await?;

    tracing::info!(files = jobs.len(), "Seeded successfully");
    Ok(())
}
