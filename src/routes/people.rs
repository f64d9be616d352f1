use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{Person, PersonDetail},
    services::people,
    state::AppState,
};

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Person>>> {
    Ok(Json(people::list_people(&state.db_pool).await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(person_id): Path<i32>,
) -> AppResult<Json<PersonDetail>> {
    let person = people::person_detail(
        &state.db_pool,
        &state.cache,
        state.config.detail_cache_ttl_secs,
        person_id,
    )
    .await?;
    Ok(Json(person))
}
