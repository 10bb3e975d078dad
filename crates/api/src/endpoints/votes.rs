//! Vote endpoints.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
};
use pitchboard_common::AppResult;

use crate::{
    extractors::CurrentCaller,
    middleware::AppState,
    response::{Created, VoteResponse, no_content},
};

/// Vote for a project.
async fn vote(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Created<VoteResponse>> {
    let vote_count = state.voting_service.vote(&project_id, &caller).await?;
    Ok(Created(VoteResponse {
        detail: "Voted successfully",
        vote_count,
    }))
}

/// Withdraw a vote.
async fn unvote(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<StatusCode> {
    state.voting_service.unvote(&project_id, &caller).await?;
    Ok(no_content())
}

/// Create the votes router.
pub fn router() -> Router<AppState> {
    Router::new().route("/{id}/vote", post(vote).delete(unvote))
}
