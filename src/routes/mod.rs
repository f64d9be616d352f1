use axum::{
    http::{HeaderValue, StatusCode},
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod auth;
pub mod comments;
pub mod lists;
pub mod movies;
pub mod people;
pub mod profiles;
pub mod ratings;
pub mod recommendations;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(cors),
        )
}

/// API routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        // Catalog
        .route("/movies", get(movies::list))
        .route("/movies/:movie_id", get(movies::detail))
        .route("/genres", get(movies::genres))
        .route("/genres/:genre_id", get(movies::genre))
        .route("/oscar_wins", get(movies::oscar_wins))
        .route("/search", get(movies::search))
        .route("/people", get(people::list))
        .route("/people/:person_id", get(people::detail))
        // Accounts
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
        .route("/profile/:user_id", get(profiles::get).put(profiles::edit))
        // Comments
        .route(
            "/movies/:movie_id/comments",
            get(comments::list).post(comments::create),
        )
        .route(
            "/movies/:movie_id/comments/:id",
            put(comments::edit).delete(comments::remove),
        )
        // Ratings; `:id` is the user id on GET and the rating id on update/delete
        .route("/movies/:movie_id/ratings", post(ratings::create))
        .route("/movies/:movie_id/ratings/:id", get(ratings::get))
        .route("/movies/:movie_id/ratings/:id/update", put(ratings::edit))
        .route("/movies/:movie_id/ratings/:id/delete", delete(ratings::remove))
        // Movie lists
        .route(
            "/profile/:user_id/lists",
            get(lists::for_user).post(lists::create),
        )
        .route("/profile/:user_id/lists/:list_id/update", put(lists::update))
        .route("/profile/:user_id/lists/:list_id/delete", delete(lists::remove))
        .route(
            "/profile/:user_id/lists/:list_id/add/:movie_id",
            post(lists::add_movie),
        )
        .route("/lists/:list_id", get(lists::detail))
        .route("/lists/:list_id/remove/:movie_id", delete(lists::remove_movie))
        // Recommendations
        .route(
            "/movies/:movie_id/recommendation",
            get(recommendations::similar_movies),
        )
        .route(
            "/profile/:user_id/recommendation",
            get(recommendations::predicted_movies),
        )
}

/// CORS for the configured frontend origin, or any origin when unset
fn cors_layer(config: &Config) -> CorsLayer {
    let origin = config
        .cors_allowed_origin
        .as_deref()
        .and_then(|origin| HeaderValue::from_str(origin).ok());

    match origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(AllowOrigin::exact(origin))
            .allow_credentials(true)
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request()),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
