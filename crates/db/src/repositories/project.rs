//! Project repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{
    Project,
    project::{self, Category, ProjectStatus},
};
use pitchboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, Order,
    QueryFilter, QueryOrder, QuerySelect, prelude::Expr, sea_query::LockType,
};

/// Filters applied when listing projects.
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    /// Only projects in this category.
    pub category: Option<Category>,
    /// Only featured (or only non-featured) projects.
    pub is_featured: Option<bool>,
}

/// Project repository for database operations.
#[derive(Clone)]
pub struct ProjectRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectRepository {
    /// Create a new project repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a project by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<project::Model>> {
        Project::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Get a project by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<project::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Project: {id}")))
    }

    /// Create a new project.
    pub async fn create(&self, model: project::ActiveModel) -> AppResult<project::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Delete a project. Images, votes, ratings and comments cascade.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Project::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// List published projects.
    ///
    /// `ordering` is applied in sequence; `id DESC` is always appended so
    /// rows with equal sort keys come back in a stable order.
    pub async fn list_published(
        &self,
        filter: &ProjectFilter,
        ordering: &[(project::Column, Order)],
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<project::Model>> {
        let mut query =
            Project::find().filter(project::Column::Status.eq(ProjectStatus::Published));

        if let Some(category) = filter.category {
            query = query.filter(project::Column::Category.eq(category));
        }
        if let Some(featured) = filter.is_featured {
            query = query.filter(project::Column::IsFeatured.eq(featured));
        }

        for (column, order) in ordering {
            query = query.order_by(*column, order.clone());
        }

        query
            .order_by_desc(project::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    // === Transaction-scoped operations ===

    /// Lock a published project row (`SELECT ... FOR UPDATE`).
    ///
    /// Every counter mutation for one project goes through this lock, so
    /// recomputing a counter never races another writer on the same row.
    pub async fn lock_published<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<project::Model> {
        Project::find_by_id(id)
            .filter(project::Column::Status.eq(ProjectStatus::Published))
            .lock(LockType::Update)
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Project: {id}")))
    }

    /// Lock a project row regardless of its status.
    pub async fn lock<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<project::Model> {
        Project::find_by_id(id)
            .lock(LockType::Update)
            .one(conn)
            .await
            .map_err(db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Project: {id}")))
    }

    /// Update a project inside a transaction.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: project::ActiveModel,
    ) -> AppResult<project::Model> {
        model.update(conn).await.map_err(db_error)
    }

    /// Overwrite the denormalized vote counter.
    pub async fn set_vote_count<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        vote_count: i32,
    ) -> AppResult<()> {
        Project::update_many()
            .col_expr(project::Column::VoteCount, Expr::value(vote_count))
            .filter(project::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Overwrite the denormalized rating aggregates.
    pub async fn set_rating_stats<C: ConnectionTrait>(
        conn: &C,
        id: &str,
        average_score: f64,
        rating_count: i32,
    ) -> AppResult<()> {
        Project::update_many()
            .col_expr(project::Column::AverageScore, Expr::value(average_score))
            .col_expr(project::Column::RatingCount, Expr::value(rating_count))
            .filter(project::Column::Id.eq(id))
            .exec(conn)
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
