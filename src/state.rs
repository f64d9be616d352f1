use std::sync::Arc;

use sqlx::PgPool;

use crate::{config::Config, db::Cache, services::repository::RecommendationRepository};

/// Shared application state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub cache: Cache,
    /// Snapshot reads for the recommendation engines
    pub recommendations: Arc<dyn RecommendationRepository>,
    pub config: Arc<Config>,
}
