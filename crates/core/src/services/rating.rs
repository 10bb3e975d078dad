//! Rating engine.
//!
//! Scores are given per criteria, and only criteria of the project's own
//! category are accepted. Every mutation recomputes the project's
//! `average_score` (plain mean over all rows) and `rating_count` inside the
//! same transaction, under the project row lock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppError, AppResult, IdGenerator};
use pitchboard_db::{
    db_error,
    entities::{criteria, rating},
    repositories::{CriteriaRepository, ProjectRepository, RatingRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::services::access::{AccessControl, Caller, Operation};
use crate::services::project::ensure_visible;

/// Lowest accepted score.
pub const MIN_SCORE: f64 = 0.0;
/// Highest accepted score.
pub const MAX_SCORE: f64 = 10.0;

/// Input for submitting a rating.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRatingInput {
    pub criteria_id: String,
    #[validate(range(min = 0.0, max = 10.0))]
    pub score: f64,
}

/// Input for changing the score of an existing rating.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateRatingInput {
    #[validate(range(min = 0.0, max = 10.0))]
    pub score: f64,
}

/// A rating together with the criteria it scores.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingDetail {
    pub id: String,
    pub criteria: criteria::Model,
    pub score: f64,
    pub created_at: chrono::DateTime<chrono::FixedOffset>,
    pub updated_at: Option<chrono::DateTime<chrono::FixedOffset>>,
}

impl RatingDetail {
    fn new(rating: rating::Model, criteria: criteria::Model) -> Self {
        Self {
            id: rating.id,
            criteria,
            score: rating.score,
            created_at: rating.created_at,
            updated_at: rating.updated_at,
        }
    }
}

/// Rating service for business logic.
#[derive(Clone)]
pub struct RatingService {
    db: Arc<DatabaseConnection>,
    rating_repo: RatingRepository,
    criteria_repo: CriteriaRepository,
    project_repo: ProjectRepository,
    access: Arc<dyn AccessControl>,
    id_gen: IdGenerator,
}

impl RatingService {
    /// Create a new rating service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            rating_repo: RatingRepository::new(Arc::clone(&db)),
            criteria_repo: CriteriaRepository::new(Arc::clone(&db)),
            project_repo: ProjectRepository::new(Arc::clone(&db)),
            db,
            access,
            id_gen: IdGenerator::new(),
        }
    }

    /// Rate a published project on one criteria.
    pub async fn submit(
        &self,
        project_id: &str,
        caller: &Caller,
        input: SubmitRatingInput,
    ) -> AppResult<RatingDetail> {
        let user_id = self.access.require_user(caller, Operation::CreateRating)?;
        validate_score(&input, input.score)?;

        // Criteria are immutable reference data; no need to read them under the lock.
        let criteria = self.criteria_repo.get_by_id(&input.criteria_id).await?;

        let txn = self.db.begin().await.map_err(db_error)?;
        let project = ProjectRepository::lock_published(&txn, project_id).await?;

        if !criteria.applies_to(project.category) {
            return Err(AppError::CriteriaMismatch {
                criteria: criteria.name,
                category: project.category.display_name().to_string(),
            });
        }

        let now = Utc::now();
        let model = rating::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            project_id: Set(project_id.to_string()),
            criteria_id: Set(criteria.id.clone()),
            score: Set(input.score),
            created_at: Set(now.into()),
            updated_at: Set(None),
        };
        let rating = match RatingRepository::insert_in(&txn, model).await {
            Ok(rating) => rating,
            Err(AppError::ConstraintViolation(_)) => {
                return Err(AppError::ConstraintViolation(format!(
                    "You have already rated this project on '{}'",
                    criteria.name
                )));
            }
            Err(e) => return Err(e),
        };

        let (average, count) = Self::refresh_stats(&txn, project_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            project_id = %project_id,
            user_id = %user_id,
            criteria_id = %criteria.id,
            score = rating.score,
            average_score = average,
            rating_count = count,
            "Rating submitted"
        );
        Ok(RatingDetail::new(rating, criteria))
    }

    /// The caller's ratings on a project.
    pub async fn list_mine(
        &self,
        project_id: &str,
        caller: &Caller,
    ) -> AppResult<Vec<RatingDetail>> {
        let user_id = self.access.require_user(caller, Operation::ReadOwnRating)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        let ratings = self
            .rating_repo
            .find_by_user_and_project(user_id, project_id)
            .await?;
        self.with_criteria(ratings).await
    }

    /// One of the caller's ratings. Other users' ratings are reported as missing.
    pub async fn get_mine(
        &self,
        project_id: &str,
        rating_id: &str,
        caller: &Caller,
    ) -> AppResult<RatingDetail> {
        let user_id = self.access.require_user(caller, Operation::ReadOwnRating)?;

        let rating = self
            .rating_repo
            .find_by_id(rating_id)
            .await?
            .filter(|r| r.project_id == project_id && r.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Rating: {rating_id}")))?;

        let criteria = self.criteria_repo.get_by_id(&rating.criteria_id).await?;
        Ok(RatingDetail::new(rating, criteria))
    }

    /// Change the score of one of the caller's ratings.
    pub async fn update_score(
        &self,
        project_id: &str,
        rating_id: &str,
        caller: &Caller,
        input: UpdateRatingInput,
    ) -> AppResult<RatingDetail> {
        let user_id = self.access.require_user(caller, Operation::UpdateRating)?;
        validate_score(&input, input.score)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        ProjectRepository::lock(&txn, project_id).await?;
        let rating = Self::find_in_project(&txn, project_id, rating_id).await?;
        self.access.authorize(caller, Operation::UpdateRating, Some(&rating.user_id))?;

        let criteria_id = rating.criteria_id.clone();
        let mut active: rating::ActiveModel = rating.into();
        active.score = Set(input.score);
        active.updated_at = Set(Some(Utc::now().into()));
        let rating = RatingRepository::update_in(&txn, active).await?;

        let (average, count) = Self::refresh_stats(&txn, project_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            project_id = %project_id,
            user_id = %user_id,
            rating_id = %rating_id,
            average_score = average,
            rating_count = count,
            "Rating updated"
        );

        let criteria = self.criteria_repo.get_by_id(&criteria_id).await?;
        Ok(RatingDetail::new(rating, criteria))
    }

    /// Delete one of the caller's ratings.
    pub async fn delete(
        &self,
        project_id: &str,
        rating_id: &str,
        caller: &Caller,
    ) -> AppResult<()> {
        let user_id = self.access.require_user(caller, Operation::DeleteRating)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        ProjectRepository::lock(&txn, project_id).await?;
        let rating = Self::find_in_project(&txn, project_id, rating_id).await?;
        self.access.authorize(caller, Operation::DeleteRating, Some(&rating.user_id))?;

        RatingRepository::delete_in(&txn, rating_id).await?;
        let (average, count) = Self::refresh_stats(&txn, project_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(
            project_id = %project_id,
            user_id = %user_id,
            rating_id = %rating_id,
            average_score = average,
            rating_count = count,
            "Rating deleted"
        );
        Ok(())
    }

    /// Check if a user has rated a project.
    pub async fn has_rated(&self, project_id: &str, user_id: &str) -> AppResult<bool> {
        self.rating_repo.has_rated(user_id, project_id).await
    }

    /// Attach criteria to ratings, fetching each distinct criteria once.
    pub async fn with_criteria(&self, ratings: Vec<rating::Model>) -> AppResult<Vec<RatingDetail>> {
        let mut ids: Vec<String> = ratings.iter().map(|r| r.criteria_id.clone()).collect();
        ids.sort_unstable();
        ids.dedup();

        let criteria: HashMap<String, criteria::Model> = self
            .criteria_repo
            .find_by_ids(&ids)
            .await?
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();

        ratings
            .into_iter()
            .map(|r| {
                let c = criteria.get(&r.criteria_id).cloned().ok_or_else(|| {
                    AppError::Internal(format!("Rating {} references missing criteria", r.id))
                })?;
                Ok(RatingDetail::new(r, c))
            })
            .collect()
    }

    async fn find_in_project<C: ConnectionTrait>(
        conn: &C,
        project_id: &str,
        rating_id: &str,
    ) -> AppResult<rating::Model> {
        RatingRepository::find_in(conn, rating_id)
            .await?
            .filter(|r| r.project_id == project_id)
            .ok_or_else(|| AppError::NotFound(format!("Rating: {rating_id}")))
    }

    /// Recompute and store the project's rating aggregates.
    async fn refresh_stats<C: ConnectionTrait>(
        conn: &C,
        project_id: &str,
    ) -> AppResult<(f64, i32)> {
        let stats = RatingRepository::stats_in(conn, project_id).await?;
        let average = stats.average.unwrap_or(0.0);
        let count = i32::try_from(stats.total)
            .map_err(|_| AppError::Internal(format!("Rating count overflow: {}", stats.total)))?;
        ProjectRepository::set_rating_stats(conn, project_id, average, count).await?;
        Ok((average, count))
    }
}

/// Range check shared by submit and update. `validator`'s range check lets
/// NaN through, so finiteness is checked separately.
fn validate_score<T: Validate>(input: &T, score: f64) -> AppResult<()> {
    input.validate()?;
    if score.is_finite() {
        Ok(())
    } else {
        Err(AppError::Validation(format!(
            "score: must be between {MIN_SCORE} and {MAX_SCORE}"
        )))
    }
}
