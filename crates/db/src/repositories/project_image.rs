//! Project image repository.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db_error;
use crate::entities::{ProjectImage, project_image};
use pitchboard_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
};

/// Project image repository for database operations.
#[derive(Clone)]
pub struct ProjectImageRepository {
    db: Arc<DatabaseConnection>,
}

impl ProjectImageRepository {
    /// Create a new project image repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an image by ID within a project.
    pub async fn find_in_project(
        &self,
        project_id: &str,
        id: &str,
    ) -> AppResult<Option<project_image::Model>> {
        ProjectImage::find_by_id(id)
            .filter(project_image::Column::ProjectId.eq(project_id))
            .one(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Get an image by ID within a project, returning an error if not found.
    pub async fn get_in_project(
        &self,
        project_id: &str,
        id: &str,
    ) -> AppResult<project_image::Model> {
        self.find_in_project(project_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Image: {id}")))
    }

    /// Images of a project in display order.
    pub async fn find_by_project(&self, project_id: &str) -> AppResult<Vec<project_image::Model>> {
        ProjectImage::find()
            .filter(project_image::Column::ProjectId.eq(project_id))
            .order_by_asc(project_image::Column::Order)
            .order_by_asc(project_image::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Images of several projects, grouped by project ID, each group in display order.
    pub async fn find_by_projects(
        &self,
        project_ids: &[String],
    ) -> AppResult<HashMap<String, Vec<project_image::Model>>> {
        if project_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let images = ProjectImage::find()
            .filter(project_image::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .order_by_asc(project_image::Column::Order)
            .order_by_asc(project_image::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)?;

        let mut grouped: HashMap<String, Vec<project_image::Model>> = HashMap::new();
        for image in images {
            grouped
                .entry(image.project_id.clone())
                .or_default()
                .push(image);
        }
        Ok(grouped)
    }

    /// Create a new image row.
    pub async fn create(
        &self,
        model: project_image::ActiveModel,
    ) -> AppResult<project_image::Model> {
        model.insert(self.db.as_ref()).await.map_err(db_error)
    }

    /// Update an image row.
    pub async fn update(
        &self,
        model: project_image::ActiveModel,
    ) -> AppResult<project_image::Model> {
        model.update(self.db.as_ref()).await.map_err(db_error)
    }

    /// Delete an image row.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        ProjectImage::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(())
    }
}
