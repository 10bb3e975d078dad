//! API endpoints.

mod comments;
mod criteria;
mod health;
mod images;
mod projects;
mod ratings;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
///
/// Paths are relative; the server mounts this under `/api`.
pub fn router() -> Router<AppState> {
    let projects = projects::router()
        .merge(votes::router())
        .merge(images::router())
        .merge(ratings::router())
        .merge(comments::router());

    Router::new()
        .nest("/projects", projects)
        .nest("/criteria", criteria::router())
        .merge(health::router())
}
