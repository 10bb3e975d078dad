//! Criteria endpoints (read-only).

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use pitchboard_common::AppResult;
use pitchboard_db::entities::{criteria, project::Category};
use serde::Deserialize;

use crate::{extractors::CurrentCaller, middleware::AppState};

/// Query for listing criteria.
#[derive(Debug, Default, Deserialize)]
pub struct ListCriteriaQuery {
    pub category: Option<Category>,
}

async fn list_criteria(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Query(query): Query<ListCriteriaQuery>,
) -> AppResult<Json<Vec<criteria::Model>>> {
    let criteria = state
        .criteria_service
        .list(&caller, query.category)
        .await?;
    Ok(Json(criteria))
}

async fn get_criteria(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<criteria::Model>> {
    let criteria = state.criteria_service.get(&caller, &id).await?;
    Ok(Json(criteria))
}

/// Create the criteria router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_criteria))
        .route("/{id}", get(get_criteria))
}
