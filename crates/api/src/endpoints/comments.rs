//! Comment endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
};
use pitchboard_common::AppResult;
use pitchboard_core::{AddCommentInput, CommentNode, UpdateCommentInput};
use pitchboard_db::entities::comment;

use crate::{
    extractors::CurrentCaller,
    middleware::AppState,
    response::{Created, no_content},
};

/// Top-level comments with their replies nested.
async fn list_comments(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<Vec<CommentNode>>> {
    let comments = state
        .comment_service
        .list_top_level(&project_id, &caller)
        .await?;
    Ok(Json(comments))
}

/// Comment on a project or reply to a comment.
async fn add_comment(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<AddCommentInput>,
) -> AppResult<Created<comment::Model>> {
    let comment = state
        .comment_service
        .add(&project_id, &caller, input)
        .await?;
    Ok(Created(comment))
}

/// One comment with its replies.
async fn get_comment(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<CommentNode>> {
    let comment = state
        .comment_service
        .get(&project_id, &comment_id, &caller)
        .await?;
    Ok(Json(comment))
}

async fn update_comment(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, comment_id)): Path<(String, String)>,
    Json(input): Json<UpdateCommentInput>,
) -> AppResult<Json<comment::Model>> {
    let comment = state
        .comment_service
        .update(&project_id, &comment_id, &caller, input)
        .await?;
    Ok(Json(comment))
}

async fn delete_comment(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path((project_id, comment_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    state
        .comment_service
        .delete(&project_id, &comment_id, &caller)
        .await?;
    Ok(no_content())
}

/// Create the comments router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/comments", get(list_comments).post(add_comment))
        .route(
            "/{id}/comments/{comment_id}",
            get(get_comment).patch(update_comment).delete(delete_comment),
        )
}
