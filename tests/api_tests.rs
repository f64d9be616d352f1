use std::sync::Arc;

use axum::http::{HeaderName, HeaderValue, StatusCode};
use axum_test::{TestResponse, TestServer};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use moviebase_api::{
    config::Config,
    db::{create_redis_client, Cache, CacheKey},
    error::AppResult,
    middleware::{SessionData, SESSION_COOKIE},
    models::{CatalogMovie, Genre, PersonRef, RatingRecord, UserRating},
    routes::create_router,
    services::RecommendationRepository,
    state::AppState,
};

/// Fixed catalog and ratings served from memory
struct InMemoryRepository {
    catalog: Vec<CatalogMovie>,
    ratings: Vec<RatingRecord>,
}

#[async_trait::async_trait]
impl RecommendationRepository for InMemoryRepository {
    async fn fetch_catalog(&self) -> AppResult<Vec<CatalogMovie>> {
        Ok(self.catalog.clone())
    }

    async fn fetch_all_ratings(&self) -> AppResult<Vec<RatingRecord>> {
        Ok(self.ratings.clone())
    }

    async fn fetch_user_ratings(&self, user_id: i32) -> AppResult<Vec<UserRating>> {
        Ok(self
            .ratings
            .iter()
            .filter(|r| r.user_id == user_id)
            .map(|r| UserRating {
                user_id: r.user_id,
                movie_id: r.movie_id,
                rating: r.rating,
            })
            .collect())
    }
}

fn movie(id: i32, title: &str, director: &str, genre: &str) -> CatalogMovie {
    CatalogMovie {
        id,
        title: title.to_string(),
        release_year: 1990 + id,
        actors: vec![],
        directors: vec![PersonRef {
            id: 100 + id,
            first_name: director.to_string(),
            last_name: None,
        }],
        genres: vec![Genre {
            id: 1,
            name: genre.to_string(),
        }],
    }
}

fn catalog() -> Vec<CatalogMovie> {
    vec![
        movie(1, "Heat", "Mann", "Crime"),
        movie(2, "Collateral", "Mann", "Crime"),
        movie(3, "Paddington", "King", "Family"),
    ]
}

fn rating(user_id: i32, movie_id: i32, rating: i32) -> RatingRecord {
    let title = catalog()
        .into_iter()
        .find(|m| m.id == movie_id)
        .map(|m| m.title)
        .unwrap_or_default();
    RatingRecord {
        user_id,
        movie_id,
        movie_title: title,
        movie_release_year: 1990 + movie_id,
        rating,
    }
}

/// Users 1 and 2 agree on Heat and Collateral; only user 2 has seen Paddington
fn community_ratings() -> Vec<RatingRecord> {
    vec![
        rating(1, 1, 5),
        rating(1, 2, 4),
        rating(2, 1, 5),
        rating(2, 2, 4),
        rating(2, 3, 4),
    ]
}

/// Server with an in-memory recommendation repository; the database is never reached
fn create_server_with_ratings(ratings: Vec<RatingRecord>) -> (TestServer, Cache) {
    let config = Config::default();
    let redis_url = std::env::var("REDIS_URL").unwrap_or_else(|_| config.redis_url.clone());
    let db_pool = PgPoolOptions::new()
        .connect_lazy(&config.database_url)
        .unwrap();
    let (cache, _handle) = Cache::new(create_redis_client(&redis_url).unwrap());

    let state = AppState {
        db_pool,
        cache: cache.clone(),
        recommendations: Arc::new(InMemoryRepository {
            catalog: catalog(),
            ratings,
        }),
        config: Arc::new(config),
    };

    (TestServer::new(create_router(state)).unwrap(), cache)
}

/// Server whose database and Redis are never reached by the routes under test
fn create_test_server() -> TestServer {
    create_server_with_ratings(vec![]).0
}

/// Stores a Redis session for `user_id` and returns the matching cookie header
async fn login_as(cache: &Cache, user_id: i32) -> HeaderValue {
    let token = Uuid::new_v4().simple().to_string();
    let session = SessionData {
        user_id,
        username: format!("viewer{}", user_id),
    };
    cache
        .set(&CacheKey::Session(token.clone()), &session, 60)
        .await
        .unwrap();
    HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, token)).unwrap()
}

async fn user_recommendations(ratings: Vec<RatingRecord>, user_id: i32) -> TestResponse {
    let (server, cache) = create_server_with_ratings(ratings);
    let cookie = login_as(&cache, user_id).await;
    server
        .get(&format!("/api/profile/{}/recommendation", user_id))
        .add_header(HeaderName::from_static("cookie"), cookie)
        .await
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_similar_movies() {
    let server = create_test_server();

    let response = server.get("/api/movies/1/recommendation").await;

    response.assert_status_ok();
    let movies: Vec<Value> = response.json();
    let ids: Vec<i64> = movies.iter().filter_map(|m| m["id"].as_i64()).collect();
    assert_eq!(ids, vec![2, 3]);
    assert_eq!(movies[0]["title"], "Collateral");
    assert_eq!(movies[0]["release_year"], 1992);
}

#[tokio::test]
async fn test_similar_movies_unknown_movie() {
    let server = create_test_server();

    let response = server.get("/api/movies/99/recommendation").await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Movie 99 not found" }));
}

#[tokio::test]
async fn test_user_recommendations_require_login() {
    let server = create_test_server();

    let response = server.get("/api/profile/1/recommendation").await;

    response.assert_status(StatusCode::UNAUTHORIZED);
    response.assert_json(&json!({ "error": "Need to login" }));
}

#[tokio::test]
async fn test_me_requires_login() {
    let server = create_test_server();
    let response = server.get("/api/me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_posting_comment_requires_login() {
    let server = create_test_server();

    let response = server
        .post("/api/movies/1/comments")
        .json(&json!({ "comment": "Great heist scene" }))
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let server = create_test_server();

    let response = server
        .post("/api/register")
        .json(&json!({
            "username": "cinephile",
            "email": "not-an-email",
            "password": "matinee-2024"
        }))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Invalid email address" }));
}

#[tokio::test]
async fn test_logout_without_session() {
    let server = create_test_server();

    let response = server.post("/api/logout").await;

    response.assert_status_ok();
    response.assert_json(&json!({ "success": "Logged out successfully" }));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let server = create_test_server();
    let request_id = Uuid::new_v4().to_string();

    let response = server
        .get("/health")
        .add_header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_str(&request_id).unwrap(),
        )
        .await;

    assert_eq!(response.header("x-request-id"), request_id.as_str());
}

#[tokio::test]
async fn test_request_id_is_generated() {
    let server = create_test_server();
    let response = server.get("/health").await;
    let header = response.header("x-request-id");
    assert!(Uuid::parse_str(header.to_str().unwrap()).is_ok());
}

// The tests below need the Redis at REDIS_URL to hold the login session.

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_user_recommendations_from_neighbour() {
    let response = user_recommendations(community_ratings(), 1).await;

    response.assert_status_ok();
    response.assert_json(&json!([{
        "id": 3,
        "title": "Paddington",
        "release_year": 1993,
        "estimated_rating": 4.0
    }]));
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_user_recommendations_without_any_ratings() {
    let response = user_recommendations(vec![], 1).await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({ "error": "Ratings not found" }));
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_user_recommendations_for_user_without_ratings() {
    let response = user_recommendations(community_ratings(), 7).await;

    response.assert_status(StatusCode::NOT_FOUND);
    response.assert_json(&json!({
        "error": "User ratings not found. Rate movies in order to get recommendations"
    }));
}

#[tokio::test]
#[ignore = "requires a running Redis"]
async fn test_user_recommendations_with_nothing_left_to_suggest() {
    let response = user_recommendations(community_ratings(), 2).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    response.assert_json(&json!({ "error": "Recommendation is not possible" }));
}
