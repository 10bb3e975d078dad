//! Criteria repository.

use std::sync::Arc;

use crate::db_error;
use crate::entities::{
    Criteria,
    criteria,
    project::Category,
};
use pitchboard_common::{AppError, AppResult};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    sea_query::OnConflict,
};

/// Criteria repository for database operations.
#[derive(Clone)]
pub struct CriteriaRepository {
    db: Arc<DatabaseConnection>,
}

impl CriteriaRepository {
    /// Create a new criteria repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find criteria by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<criteria::Model>> {
        Criteria::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Get criteria by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<criteria::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Criteria: {id}")))
    }

    /// List criteria, optionally restricted to one category.
    pub async fn list(&self, category: Option<Category>) -> AppResult<Vec<criteria::Model>> {
        let mut query = Criteria::find();
        if let Some(category) = category {
            query = query.filter(criteria::Column::ProjectCategory.eq(category));
        }

        query
            .order_by_asc(criteria::Column::ProjectCategory)
            .order_by_asc(criteria::Column::Name)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Fetch several criteria at once.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<criteria::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        Criteria::find()
            .filter(criteria::Column::Id.is_in(ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Insert criteria unless one with the same (name, category) exists.
    ///
    /// Returns `true` when a row was inserted.
    pub async fn insert_if_absent(&self, model: criteria::ActiveModel) -> AppResult<bool> {
        let result = Criteria::insert(model)
            .on_conflict(
                OnConflict::columns([
                    criteria::Column::Name,
                    criteria::Column::ProjectCategory,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await;

        match result {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(db_error(e)),
        }
    }
}
