//! Rating endpoints. Every route is scoped to the caller's own ratings.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use pitchboard_common::AppResult;
use pitchboard_core::{RatingDetail, SubmitRatingInput, UpdateRatingInput};

use crate::{
    extractors::CurrentCaller,
    middleware::AppState,
    response::{Created, no_content},
};

/// The caller's ratings on a project.
async fn list_ratings(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Vec<RatingDetail>>> {
    let ratings = state.rating_service.list_mine(&project_id, &caller).await?;
    Ok(Json(ratings))
}

/// Rate a project on one criteria.
async fn submit_rating(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<SubmitRatingInput>,
) -> AppResult<Created<RatingDetail>> {
    let rating = state
        .rating_service
        .submit(&project_id, &caller, input)
        .await?;
    Ok(Created(rating))
}

async fn get_rating(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, rating_id)): Path<(String, String)>,
) -> AppResult<Json<RatingDetail>> {
    let rating = state
        .rating_service
        .get_mine(&project_id, &rating_id, &caller)
        .await?;
    Ok(Json(rating))
}

async fn update_rating(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, rating_id)): Path<(String, String)>,
    Json(input): Json<UpdateRatingInput>,
) -> AppResult<Json<RatingDetail>> {
    let rating = state
        .rating_service
        .update_score(&project_id, &rating_id, &caller, input)
        .await?;
    Ok(Json(rating))
}

async fn delete_rating(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, rating_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .rating_service
        .delete(&project_id, &rating_id, &caller)
        .await?;
    Ok(no_content())
}

/// Create the ratings router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/ratings", get(list_ratings).post(submit_rating))
        .route(
            "/{id}/ratings/{rating_id}",
            get(get_rating).patch(update_rating).delete(delete_rating),
        )
}
