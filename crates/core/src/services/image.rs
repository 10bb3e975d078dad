//! Project image service.
//!
//! Image bytes go to a [`StorageBackend`]; the database keeps the storage key
//! and public URL.

use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppError, AppResult, IdGenerator, StorageBackend, image_extension};
use pitchboard_db::{
    entities::project_image,
    repositories::{ProjectImageRepository, ProjectRepository},
};
use sea_orm::{DatabaseConnection, Set};
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use crate::services::access::{AccessControl, Caller, Operation};
use crate::services::project::ensure_visible;

/// An uploaded image and its metadata.
#[derive(Debug, Clone, Validate)]
pub struct UploadImageInput {
    pub data: Vec<u8>,
    pub content_type: String,
    #[validate(length(max = 256))]
    pub caption: Option<String>,
    pub order: i32,
}

/// Input for editing image metadata.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateImageInput {
    #[validate(length(max = 256))]
    pub caption: Option<String>,
    pub order: Option<i32>,
}

/// Project image service for business logic.
#[derive(Clone)]
pub struct ProjectImageService {
    image_repo: ProjectImageRepository,
    project_repo: ProjectRepository,
    storage: Arc<dyn StorageBackend>,
    access: Arc<dyn AccessControl>,
    max_upload_bytes: usize,
    id_gen: IdGenerator,
}

impl ProjectImageService {
    /// Create a new project image service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        access: Arc<dyn AccessControl>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            image_repo: ProjectImageRepository::new(Arc::clone(&db)),
            project_repo: ProjectRepository::new(db),
            storage,
            access,
            max_upload_bytes,
            id_gen: IdGenerator::new(),
        }
    }

    /// Images of a project in display order.
    pub async fn list(
        &self,
        project_id: &str,
        caller: &Caller,
    ) -> AppResult<Vec<project_image::Model>> {
        self.access.authorize(caller, Operation::ReadImage, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        self.image_repo.find_by_project(project_id).await
    }

    /// One image of a project.
    pub async fn get(
        &self,
        project_id: &str,
        image_id: &str,
        caller: &Caller,
    ) -> AppResult<project_image::Model> {
        self.access.authorize(caller, Operation::ReadImage, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        self.image_repo.get_in_project(project_id, image_id).await
    }

    /// Store an image for the caller's project.
    pub async fn upload(
        &self,
        project_id: &str,
        caller: &Caller,
        input: UploadImageInput,
    ) -> AppResult<project_image::Model> {
        self.access.require_user(caller, Operation::CreateImage)?;
        input.validate()?;

        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;
        self.access.authorize(caller, Operation::CreateImage, Some(&project.creator_id))?;

        let extension = image_extension(&input.content_type).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported image type: {}", input.content_type))
        })?;
        if input.data.is_empty() {
            return Err(AppError::BadRequest("Image is empty".to_string()));
        }
        if input.data.len() > self.max_upload_bytes {
            return Err(AppError::BadRequest(format!(
                "Image exceeds the {} byte limit",
                self.max_upload_bytes
            )));
        }

        let key = self.id_gen.storage_key(project_id, extension);
        let stored = self
            .storage
            .upload(&key, &input.data, &input.content_type)
            .await?;

        let model = project_image::ActiveModel {
            id: Set(self.id_gen.generate()),
            project_id: Set(project_id.to_string()),
            image: Set(stored.key.clone()),
            url: Set(stored.url.clone()),
            caption: Set(input.caption.filter(|c| !c.is_empty())),
            order: Set(input.order),
            created_at: Set(Utc::now().into()),
        };

        match self.image_repo.create(model).await {
            Ok(image) => {
                info!(
                    project_id = %project_id,
                    image_id = %image.id,
                    size = stored.size,
                    md5 = %stored.md5,
                    "Image uploaded"
                );
                Ok(image)
            }
            Err(e) => {
                // Don't leave an orphaned file behind.
                if let Err(cleanup) = self.storage.delete(&stored.key).await {
                    warn!(key = %stored.key, error = %cleanup, "Failed to remove orphaned upload");
                }
                Err(e)
            }
        }
    }

    /// Edit the caption or order of an image on the caller's project.
    pub async fn update(
        &self,
        project_id: &str,
        image_id: &str,
        caller: &Caller,
        input: UpdateImageInput,
    ) -> AppResult<project_image::Model> {
        self.access.require_user(caller, Operation::UpdateImage)?;
        input.validate()?;

        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;
        self.access.authorize(caller, Operation::UpdateImage, Some(&project.creator_id))?;

        let image = self.image_repo.get_in_project(project_id, image_id).await?;
        let mut active: project_image::ActiveModel = image.into();
        if let Some(caption) = input.caption {
            active.caption = Set(Some(caption).filter(|c| !c.is_empty()));
        }
        if let Some(order) = input.order {
            active.order = Set(order);
        }

        self.image_repo.update(active).await
    }

    /// Delete an image from the caller's project, including the stored file.
    pub async fn delete(&self, project_id: &str, image_id: &str, caller: &Caller) -> AppResult<()> {
        self.access.require_user(caller, Operation::DeleteImage)?;

        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;
        self.access.authorize(caller, Operation::DeleteImage, Some(&project.creator_id))?;

        let image = self.image_repo.get_in_project(project_id, image_id).await?;
        self.image_repo.delete(image_id).await?;

        if let Err(e) = self.storage.delete(&image.image).await {
            warn!(key = %image.image, error = %e, "Failed to delete stored image");
        }

        info!(project_id = %project_id, image_id = %image_id, "Image deleted");
        Ok(())
    }
}
