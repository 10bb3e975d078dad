//! Project service.

use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppError, AppResult, IdGenerator, StorageBackend};
use pitchboard_db::{
    db_error,
    entities::project::{self, Category, ProjectStatus},
    repositories::{ProjectFilter, ProjectImageRepository, ProjectRepository, RatingRepository},
};
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use tracing::{info, warn};
use validator::{Validate, ValidateUrl, ValidationError};

use crate::services::access::{AccessControl, Caller, Operation};
use crate::services::ordering::parse_ordering;

/// Default page size for project lists.
pub const DEFAULT_LIMIT: u64 = 20;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u64 = 100;

/// Drafts exist only for their creator; everyone else gets `NotFound`.
pub fn ensure_visible(project: &project::Model, caller: &Caller) -> AppResult<()> {
    let visible = project.status == ProjectStatus::Published
        || caller.user_id().is_some_and(|id| project.is_owned_by(id));
    if visible {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("Project: {}", project.id)))
    }
}

/// Input for creating a project.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 5000))]
    pub description: String,
    pub category: Category,
    #[validate(custom(function = "validate_link"))]
    pub repository_link: Option<String>,
    #[validate(custom(function = "validate_link"))]
    pub live_link: Option<String>,
}

/// Partial update of a project. Absent fields are left unchanged; an empty
/// link clears it.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProjectInput {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 5000))]
    pub description: Option<String>,
    pub category: Option<Category>,
    pub status: Option<ProjectStatus>,
    #[validate(custom(function = "validate_link"))]
    pub repository_link: Option<String>,
    #[validate(custom(function = "validate_link"))]
    pub live_link: Option<String>,
}

/// Query parameters for listing projects.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListProjectsQuery {
    pub category: Option<Category>,
    pub is_featured: Option<bool>,
    pub ordering: Option<String>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Project service for business logic.
#[derive(Clone)]
pub struct ProjectService {
    db: Arc<DatabaseConnection>,
    project_repo: ProjectRepository,
    image_repo: ProjectImageRepository,
    storage: Arc<dyn StorageBackend>,
    access: Arc<dyn AccessControl>,
    id_gen: IdGenerator,
}

impl ProjectService {
    /// Create a new project service.
    #[must_use]
    pub fn new(
        db: Arc<DatabaseConnection>,
        storage: Arc<dyn StorageBackend>,
        access: Arc<dyn AccessControl>,
    ) -> Self {
        Self {
            project_repo: ProjectRepository::new(Arc::clone(&db)),
            image_repo: ProjectImageRepository::new(Arc::clone(&db)),
            db,
            storage,
            access,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a published project owned by the caller.
    pub async fn create(
        &self,
        caller: &Caller,
        input: CreateProjectInput,
    ) -> AppResult<project::Model> {
        let user_id = self.access.require_user(caller, Operation::CreateProject)?;
        input.validate()?;
        let name = non_blank_name(input.name)?;

        let model = project::ActiveModel {
            id: Set(self.id_gen.generate()),
            name: Set(name),
            description: Set(input.description),
            category: Set(input.category),
            creator_id: Set(user_id.to_string()),
            status: Set(ProjectStatus::Published),
            is_featured: Set(false),
            repository_link: Set(empty_to_none(input.repository_link)),
            live_link: Set(empty_to_none(input.live_link)),
            vote_count: Set(0),
            average_score: Set(0.0),
            rating_count: Set(0),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        };
        let project = self.project_repo.create(model).await?;

        info!(
            project_id = %project.id,
            creator_id = %user_id,
            category = ?project.category,
            "Project created"
        );
        Ok(project)
    }

    /// Get a project the caller may see.
    pub async fn get(&self, project_id: &str, caller: &Caller) -> AppResult<project::Model> {
        self.access.authorize(caller, Operation::ReadProject, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;
        Ok(project)
    }

    /// List published projects.
    pub async fn list(
        &self,
        caller: &Caller,
        query: &ListProjectsQuery,
    ) -> AppResult<Vec<project::Model>> {
        self.access.authorize(caller, Operation::ReadProject, None)?;

        let filter = ProjectFilter {
            category: query.category,
            is_featured: query.is_featured,
        };
        let ordering = parse_ordering(query.ordering.as_deref());
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = query.offset.unwrap_or(0);

        self.project_repo
            .list_published(&filter, &ordering, limit, offset)
            .await
    }

    /// Update the caller's project.
    ///
    /// The category may only change while the project has no ratings, since
    /// existing ratings were checked against the old category's criteria.
    pub async fn update(
        &self,
        project_id: &str,
        caller: &Caller,
        input: UpdateProjectInput,
    ) -> AppResult<project::Model> {
        self.access.require_user(caller, Operation::UpdateProject)?;
        input.validate()?;

        let txn = self.db.begin().await.map_err(db_error)?;
        let project = ProjectRepository::lock(&txn, project_id).await?;
        ensure_visible(&project, caller)?;
        self.access.authorize(caller, Operation::UpdateProject, Some(&project.creator_id))?;

        if let Some(category) = input.category
            && category != project.category
            && RatingRepository::count_in(&txn, project_id).await? > 0
        {
            return Err(AppError::BadRequest(
                "Category cannot be changed once the project has ratings".to_string(),
            ));
        }

        let mut active: project::ActiveModel = project.into();
        if let Some(name) = input.name {
            active.name = Set(non_blank_name(name)?);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(status) = input.status {
            active.status = Set(status);
        }
        if let Some(link) = input.repository_link {
            active.repository_link = Set(empty_to_none(Some(link)));
        }
        if let Some(link) = input.live_link {
            active.live_link = Set(empty_to_none(Some(link)));
        }
        active.updated_at = Set(Some(Utc::now().into()));

        let project = ProjectRepository::update_in(&txn, active).await?;
        txn.commit().await.map_err(db_error)?;

        info!(project_id = %project_id, "Project updated");
        Ok(project)
    }

    /// Delete the caller's project and everything attached to it.
    pub async fn delete(&self, project_id: &str, caller: &Caller) -> AppResult<()> {
        self.access.require_user(caller, Operation::DeleteProject)?;

        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;
        self.access.authorize(caller, Operation::DeleteProject, Some(&project.creator_id))?;

        let images = self.image_repo.find_by_project(project_id).await?;
        self.project_repo.delete(project_id).await?;

        // Rows are gone via cascade; stored files are cleaned up best-effort.
        for image in images {
            if let Err(e) = self.storage.delete(&image.image).await {
                warn!(key = %image.image, error = %e, "Failed to delete stored image");
            }
        }

        info!(project_id = %project_id, "Project deleted");
        Ok(())
    }
}

fn non_blank_name(name: String) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        Err(AppError::Validation("name: may not be blank".to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}

/// A link is either blank (no link) or an absolute URL.
fn validate_link(link: &str) -> Result<(), ValidationError> {
    if link.trim().is_empty() || link.validate_url() {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

fn empty_to_none(link: Option<String>) -> Option<String> {
    link.filter(|l| !l.trim().is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::access::PolicyTable;
    use crate::services::test_support::{count_row, create_test_project, exec_ok};
    use pitchboard_common::LocalStorage;
    use pitchboard_db::entities::project_image;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: DatabaseConnection) -> ProjectService {
        let storage = LocalStorage::new(
            std::env::temp_dir().join("pitchboard-project-tests"),
            "/media".to_string(),
        );
        ProjectService::new(
            Arc::new(db),
            Arc::new(storage),
            Arc::new(PolicyTable::default()),
        )
    }

    fn user(id: &str) -> Caller {
        Caller::User(id.to_string())
    }

    fn create_input(name: &str) -> CreateProjectInput {
        CreateProjectInput {
            name: name.to_string(),
            description: "Something new".to_string(),
            category: Category::Web,
            repository_link: Some("https://git.example/repo".to_string()),
            live_link: None,
        }
    }

    #[test]
    fn test_ensure_visible() {
        let mut project = create_test_project("p1", "alice");
        assert!(ensure_visible(&project, &Caller::Anonymous).is_ok());

        project.status = ProjectStatus::Draft;
        assert!(ensure_visible(&project, &user("alice")).is_ok());
        assert!(matches!(
            ensure_visible(&project, &user("bob")),
            Err(AppError::NotFound(_))
        ));
        assert!(ensure_visible(&project, &Caller::Anonymous).is_err());
    }

    #[tokio::test]
    async fn test_create_project() {
        let mut created = create_test_project("p1", "alice");
        created.category = Category::Web;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[created]])
                .into_connection(),
        );

        let project = service
            .create(&user("alice"), create_input("Pitchboard"))
            .await
            .unwrap();
        assert_eq!(project.creator_id, "alice");
        assert_eq!(project.status, ProjectStatus::Published);
    }

    #[tokio::test]
    async fn test_create_validates_input() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let too_long = service
            .create(&user("alice"), create_input(&"x".repeat(201)))
            .await;
        assert!(matches!(too_long, Err(AppError::Validation(_))));

        let blank = service.create(&user("alice"), create_input("   ")).await;
        assert!(matches!(blank, Err(AppError::Validation(_))));

        let mut bad_link = create_input("ok");
        bad_link.live_link = Some("not a url".to_string());
        assert!(matches!(
            service.create(&user("alice"), bad_link).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_create_anonymous_is_unauthenticated() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service.create(&Caller::Anonymous, create_input("x")).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_update_by_non_creator_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .into_connection(),
        );

        let input = UpdateProjectInput {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        };
        let result = service.update("p1", &user("bob"), input).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_update_by_creator() {
        let mut updated = create_test_project("p1", "alice");
        updated.name = "Renamed".to_string();

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[updated]])
                .into_connection(),
        );

        let input = UpdateProjectInput {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };
        let project = service.update("p1", &user("alice"), input).await.unwrap();
        assert_eq!(project.name, "Renamed");
    }

    #[tokio::test]
    async fn test_update_rejects_invalid_link() {
        let service = service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        for input in [
            UpdateProjectInput {
                repository_link: Some("not a url".to_string()),
                ..Default::default()
            },
            UpdateProjectInput {
                live_link: Some("example dot com".to_string()),
                ..Default::default()
            },
        ] {
            let result = service.update("p1", &user("alice"), input).await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_update_with_blank_link_clears_it() {
        let mut linked = create_test_project("p1", "alice");
        linked.live_link = Some("https://demo.example".to_string());
        let cleared = create_test_project("p1", "alice");

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[linked]])
                .append_query_results([[cleared]])
                .into_connection(),
        );

        let input = UpdateProjectInput {
            live_link: Some(String::new()),
            ..Default::default()
        };
        let project = service.update("p1", &user("alice"), input).await.unwrap();
        assert_eq!(project.live_link, None);
    }

    #[test]
    fn test_validate_link() {
        assert!(validate_link("https://git.example/repo").is_ok());
        assert!(validate_link("").is_ok());
        assert!(validate_link("  ").is_ok());
        assert!(validate_link("not a url").is_err());
    }

    #[tokio::test]
    async fn test_category_locked_once_rated() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[count_row(2)]])
                .into_connection(),
        );

        let input = UpdateProjectInput {
            category: Some(Category::Game),
            ..Default::default()
        };
        let result = service.update("p1", &user("alice"), input).await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_delete_by_non_creator_is_forbidden() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .into_connection(),
        );

        let result = service.delete("p1", &user("bob")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_delete_by_creator() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([Vec::<project_image::Model>::new()])
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        service.delete("p1", &user("alice")).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_clamps_limit() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .into_connection(),
        );

        let query = ListProjectsQuery {
            limit: Some(10_000),
            ordering: Some("-vote_count".to_string()),
            ..Default::default()
        };
        let projects = service.list(&Caller::Anonymous, &query).await.unwrap();
        assert_eq!(projects.len(), 1);
    }
}
