//! Rating criteria service.
//!
//! Criteria are global reference data: seeded at startup and read-only
//! through the API.

use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppResult, IdGenerator};
use pitchboard_db::{
    entities::{criteria, project::Category},
    repositories::CriteriaRepository,
};
use sea_orm::{DatabaseConnection, Set};
use tracing::info;

use crate::services::access::{AccessControl, Caller, Operation};

/// Built-in criteria: (category, name, description, weight).
const DEFAULT_CRITERIA: &[(Category, &str, &str, f64)] = &[
    (Category::Poll, "Clarity", "Questions are clear and unambiguous", 1.0),
    (Category::Poll, "Relevance", "The poll asks something worth answering", 1.0),
    (Category::App, "Usability", "How easy the app is to pick up and use", 1.0),
    (Category::App, "Performance", "Responsiveness and resource usage", 1.0),
    (Category::App, "Design", "Visual polish and consistency", 1.0),
    (Category::Web, "Usability", "Navigation and overall ease of use", 1.0),
    (Category::Web, "Design", "Layout, typography and visual polish", 1.0),
    (Category::Web, "Accessibility", "Works with assistive technology", 1.0),
    (Category::Game, "Gameplay", "How fun and engaging it is to play", 1.5),
    (Category::Game, "Graphics", "Art direction and visual quality", 1.0),
    (Category::Game, "Audio", "Music and sound design", 1.0),
    (Category::Hardware, "Build Quality", "Sturdiness and finish of the build", 1.0),
    (Category::Hardware, "Innovation", "Novelty of the idea or approach", 1.0),
    (Category::Hardware, "Documentation", "Schematics, BOM and build notes", 1.0),
    (Category::Other, "Originality", "How fresh the idea is", 1.0),
    (Category::Other, "Execution", "How well the idea was carried out", 1.0),
];

/// Criteria service for business logic.
#[derive(Clone)]
pub struct CriteriaService {
    criteria_repo: CriteriaRepository,
    access: Arc<dyn AccessControl>,
    id_gen: IdGenerator,
}

impl CriteriaService {
    /// Create a new criteria service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            criteria_repo: CriteriaRepository::new(db),
            access,
            id_gen: IdGenerator::new(),
        }
    }

    /// List criteria, optionally for one category only.
    pub async fn list(
        &self,
        caller: &Caller,
        category: Option<Category>,
    ) -> AppResult<Vec<criteria::Model>> {
        self.access.authorize(caller, Operation::ReadCriteria, None)?;
        self.criteria_repo.list(category).await
    }

    /// Get criteria by ID.
    pub async fn get(&self, caller: &Caller, id: &str) -> AppResult<criteria::Model> {
        self.access.authorize(caller, Operation::ReadCriteria, None)?;
        self.criteria_repo.get_by_id(id).await
    }

    /// Criteria that apply to projects of `category`.
    pub async fn for_category(&self, category: Category) -> AppResult<Vec<criteria::Model>> {
        self.criteria_repo.list(Some(category)).await
    }

    /// Insert the built-in criteria that are not present yet.
    ///
    /// Safe to run on every startup. Returns how many rows were inserted.
    pub async fn seed_default_criteria(&self) -> AppResult<usize> {
        let mut inserted = 0;
        for &(category, name, description, weight) in DEFAULT_CRITERIA {
            let model = criteria::ActiveModel {
                id: Set(self.id_gen.generate()),
                name: Set(name.to_string()),
                description: Set(description.to_string()),
                weight: Set(weight),
                project_category: Set(category),
                created_at: Set(Utc::now().into()),
            };
            if self.criteria_repo.insert_if_absent(model).await? {
                inserted += 1;
            }
        }

        if inserted > 0 {
            info!(inserted, "Seeded default rating criteria");
        }
        Ok(inserted)
    }
}
