//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use pitchboard_common::StorageBackend;
use pitchboard_core::{
    AccessControl, Caller, CommentService, CriteriaService, IdentityProvider,
    ProjectImageService, ProjectService, ProjectViewService, RatingService, VotingService,
};
use sea_orm::DatabaseConnection;
use tracing::debug;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub project_service: ProjectService,
    pub view_service: ProjectViewService,
    pub voting_service: VotingService,
    pub rating_service: RatingService,
    pub comment_service: CommentService,
    pub image_service: ProjectImageService,
    pub criteria_service: CriteriaService,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    /// Build every service over one connection pool and one access policy.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        identity: Arc<dyn IdentityProvider>,
        access: Arc<dyn AccessControl>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            project_service: ProjectService::new(
                Arc::clone(&db),
                Arc::clone(&storage),
                Arc::clone(&access),
            ),
            view_service: ProjectViewService::new(Arc::clone(&db), Arc::clone(&access)),
            voting_service: VotingService::new(Arc::clone(&db), Arc::clone(&access)),
            rating_service: RatingService::new(Arc::clone(&db), Arc::clone(&access)),
            comment_service: CommentService::new(Arc::clone(&db), Arc::clone(&access)),
            image_service: ProjectImageService::new(
                Arc::clone(&db),
                storage,
                Arc::clone(&access),
                max_upload_bytes,
            ),
            criteria_service: CriteriaService::new(db, access),
            identity,
        }
    }
}

/// Authentication middleware.
///
/// Every request leaves with a [`Caller`] in its extensions. Missing or
/// rejected credentials resolve to [`Caller::Anonymous`]; whether that is
/// enough is decided later by the access policy.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let credential = req
        .headers()
        .get(state.identity.header_name())
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);

    let caller = state.identity.identify(credential.as_deref()).await;
    if let Caller::User(id) = &caller {
        debug!(user_id = %id, "Request authenticated");
    }
    req.extensions_mut().insert(caller);

    next.run(req).await
}
