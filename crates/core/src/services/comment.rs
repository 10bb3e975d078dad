//! Comment service.

use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppError, AppResult, IdGenerator};
use pitchboard_db::{
    entities::comment,
    repositories::{CommentRepository, ProjectRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use crate::services::access::{AccessControl, Caller, Operation};
use crate::services::comment_tree::{CommentNode, build_comment_tree};
use crate::services::project::ensure_visible;

/// Input for adding a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    /// Comment being replied to, if any.
    #[serde(default, alias = "parent")]
    pub parent_id: Option<String>,
}

/// Input for editing a comment.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCommentInput {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
}

/// Comment service for business logic.
#[derive(Clone)]
pub struct CommentService {
    comment_repo: CommentRepository,
    project_repo: ProjectRepository,
    access: Arc<dyn AccessControl>,
    id_gen: IdGenerator,
}

impl CommentService {
    /// Create a new comment service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            comment_repo: CommentRepository::new(Arc::clone(&db)),
            project_repo: ProjectRepository::new(db),
            access,
            id_gen: IdGenerator::new(),
        }
    }

    /// Add a comment (or a reply) to a project.
    pub async fn add(
        &self,
        project_id: &str,
        caller: &Caller,
        input: AddCommentInput,
    ) -> AppResult<comment::Model> {
        let user_id = self.access.require_user(caller, Operation::CreateComment)?;
        input.validate()?;
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("content: may not be blank".to_string()));
        }

        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        if let Some(parent_id) = &input.parent_id
            && self
                .comment_repo
                .find_in_project(project_id, parent_id)
                .await?
                .is_none()
        {
            return Err(AppError::InvalidParent(format!(
                "Comment {parent_id} does not exist on this project"
            )));
        }

        let now = Utc::now();
        let model = comment::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(project_id.to_string()),
            user_id: Set(user_id.to_string()),
            content: Set(input.content),
            parent_id: Set(input.parent_id),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        let comment = self.comment_repo.create(model).await?;

        info!(
            project_id = %project_id,
            comment_id = %comment.id,
            parent_id = ?comment.parent_id,
            "Comment added"
        );
        Ok(comment)
    }

    /// Top-level comments of a project, each with its nested replies.
    pub async fn list_top_level(
        &self,
        project_id: &str,
        caller: &Caller,
    ) -> AppResult<Vec<CommentNode>> {
        self.access.authorize(caller, Operation::ReadComment, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        self.tree(project_id).await
    }

    /// Build the comment forest of a project without access checks.
    pub(crate) async fn tree(&self, project_id: &str) -> AppResult<Vec<CommentNode>> {
        let comments = self.comment_repo.find_by_project(project_id).await?;
        Ok(build_comment_tree(comments))
    }

    /// One comment with its nested replies.
    pub async fn get(
        &self,
        project_id: &str,
        comment_id: &str,
        caller: &Caller,
    ) -> AppResult<CommentNode> {
        self.access.authorize(caller, Operation::ReadComment, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        let forest = self.tree(project_id).await?;
        forest
            .iter()
            .find_map(|root| root.find(comment_id))
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Comment: {comment_id}")))
    }

    /// Edit the content of the caller's comment.
    pub async fn update(
        &self,
        project_id: &str,
        comment_id: &str,
        caller: &Caller,
        input: UpdateCommentInput,
    ) -> AppResult<comment::Model> {
        self.access.require_user(caller, Operation::UpdateComment)?;
        input.validate()?;
        if input.content.trim().is_empty() {
            return Err(AppError::Validation("content: may not be blank".to_string()));
        }

        let comment = self
            .comment_repo
            .get_in_project(project_id, comment_id)
            .await?;
        self.access.authorize(caller, Operation::UpdateComment, Some(&comment.user_id))?;

        let mut active: comment::ActiveModel = comment.into();
        active.content = Set(input.content);
        active.updated_at = Set(Utc::now().into());
        let comment = self.comment_repo.update(active).await?;

        info!(project_id = %project_id, comment_id = %comment_id, "Comment updated");
        Ok(comment)
    }

    /// Delete the caller's comment together with all replies below it.
    pub async fn delete(
        &self,
        project_id: &str,
        comment_id: &str,
        caller: &Caller,
    ) -> AppResult<()> {
        self.access.require_user(caller, Operation::DeleteComment)?;

        let comment = self
            .comment_repo
            .get_in_project(project_id, comment_id)
            .await?;
        self.access.authorize(caller, Operation::DeleteComment, Some(&comment.user_id))?;

        self.comment_repo.delete(comment_id).await?;

        info!(project_id = %project_id, comment_id = %comment_id, "Comment deleted");
        Ok(())
    }
}
