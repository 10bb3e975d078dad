//! Project endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use pitchboard_common::AppResult;
use pitchboard_core::{
    CreateProjectInput, ListProjectsQuery, ProjectDetail, ProjectSummary, UpdateProjectInput,
};

use crate::{
    extractors::CurrentCaller,
    middleware::AppState,
    response::{Created, no_content},
};

/// List published projects.
async fn list_projects(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Query(query): Query<ListProjectsQuery>,
) -> AppResult<Json<Vec<ProjectSummary>>> {
    let projects = state.project_service.list(&caller, &query).await?;
    let summaries = state.view_service.summarize(projects, &caller).await?;
    Ok(Json(summaries))
}

/// Create a project owned by the caller.
async fn create_project(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Json(input): Json<CreateProjectInput>,
) -> AppResult<Created<ProjectSummary>> {
    let project = state.project_service.create(&caller, input).await?;
    let summary = state.view_service.summary(project, &caller).await?;
    Ok(Created(summary))
}

/// Project detail with ratings, criteria and comments.
async fn get_project(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<Json<ProjectDetail>> {
    let detail = state.view_service.detail(&project_id, &caller).await?;
    Ok(Json(detail))
}

/// Partially update a project.
async fn update_project(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(input): Json<UpdateProjectInput>,
) -> AppResult<Json<ProjectSummary>> {
    let project = state
        .project_service
        .update(&project_id, &caller, input)
        .await?;
    let summary = state.view_service.summary(project, &caller).await?;
    Ok(Json(summary))
}

/// Delete a project.
async fn delete_project(
    CurrentCaller(caller): CurrentCaller,
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> AppResult<StatusCode> {
    state.project_service.delete(&project_id, &caller).await?;
    Ok(no_content())
}

/// Create the projects router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_projects).post(create_project))
        .route(
            "/{id}",
            get(get_project).patch(update_project).delete(delete_project),
        )
}
