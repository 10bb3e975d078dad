//! Rating repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::db_error;
use crate::entities::{Rating, rating};
use pitchboard_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
    sea_query::{Expr, Func, SimpleExpr},
};

/// Aggregate over all ratings of one project.
#[derive(Debug, Clone, Copy, PartialEq, FromQueryResult)]
pub struct RatingStats {
    /// Mean score; `None` when the project has no ratings.
    pub average: Option<f64>,
    /// Number of rating rows.
    pub total: i64,
}

/// Rating repository for database operations.
#[derive(Clone)]
pub struct RatingRepository {
    db: Arc<DatabaseConnection>,
}

impl RatingRepository {
    /// Create a new rating repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a rating by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<rating::Model>> {
        Self::find_in(self.db.as_ref(), id).await
    }

    /// All ratings a user gave on a project.
    pub async fn find_by_user_and_project(
        &self,
        user_id: &str,
        project_id: &str,
    ) -> AppResult<Vec<rating::Model>> {
        Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::ProjectId.eq(project_id))
            .order_by_asc(rating::Column::CreatedAt)
            .order_by_asc(rating::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// All ratings on a project, oldest first.
    pub async fn find_by_project(&self, project_id: &str) -> AppResult<Vec<rating::Model>> {
        Rating::find()
            .filter(rating::Column::ProjectId.eq(project_id))
            .order_by_asc(rating::Column::CreatedAt)
            .order_by_asc(rating::Column::Id)
            .all(self.db.as_ref())
            .await
            .map_err(db_error)
    }

    /// Check if a user has rated a project on any criteria.
    pub async fn has_rated(&self, user_id: &str, project_id: &str) -> AppResult<bool> {
        let count = Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::ProjectId.eq(project_id))
            .count(self.db.as_ref())
            .await
            .map_err(db_error)?;
        Ok(count > 0)
    }

    /// Of `project_ids`, the ones `user_id` has rated.
    pub async fn rated_project_ids(
        &self,
        user_id: &str,
        project_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if project_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let ratings = Rating::find()
            .filter(rating::Column::UserId.eq(user_id))
            .filter(rating::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(ratings.into_iter().map(|r| r.project_id).collect())
    }

    // === Transaction-scoped operations ===

    /// Find a rating by ID.
    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        id: &str,
    ) -> AppResult<Option<rating::Model>> {
        Rating::find_by_id(id).one(conn).await.map_err(db_error)
    }

    /// Insert a rating. A duplicate (user, project, criteria) triple
    /// surfaces as `AppError::ConstraintViolation`.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: rating::ActiveModel,
    ) -> AppResult<rating::Model> {
        model.insert(conn).await.map_err(db_error)
    }

    /// Update a rating.
    pub async fn update_in<C: ConnectionTrait>(
        conn: &C,
        model: rating::ActiveModel,
    ) -> AppResult<rating::Model> {
        model.update(conn).await.map_err(db_error)
    }

    /// Delete a rating by ID.
    pub async fn delete_in<C: ConnectionTrait>(conn: &C, id: &str) -> AppResult<()> {
        Rating::delete_by_id(id)
            .exec(conn)
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Count ratings on a project.
    pub async fn count_in<C: ConnectionTrait>(conn: &C, project_id: &str) -> AppResult<u64> {
        Rating::find()
            .filter(rating::Column::ProjectId.eq(project_id))
            .count(conn)
            .await
            .map_err(db_error)
    }

    /// Mean score and row count over a project's ratings.
    pub async fn stats_in<C: ConnectionTrait>(
        conn: &C,
        project_id: &str,
    ) -> AppResult<RatingStats> {
        let stats = Rating::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col(rating::Column::Score))),
                "average",
            )
            .column_as(Expr::col(rating::Column::Id).count(), "total")
            .filter(rating::Column::ProjectId.eq(project_id))
            .into_model::<RatingStats>()
            .one(conn)
            .await
            .map_err(db_error)?;

        Ok(stats.unwrap_or(RatingStats {
            average: None,
            total: 0,
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use maplit::btreemap;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};

    fn create_test_rating(id: &str, user_id: &str, project_id: &str, score: f64) -> rating::Model {
        rating::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            criteria_id: "c1".to_string(),
            score,
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_user_and_project() {
        let r1 = create_test_rating("r1", "user1", "p1", 8.0);

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[r1.clone()]])
                .into_connection(),
        );

        let repo = RatingRepository::new(db);
        let result = repo.find_by_user_and_project("user1", "p1").await.unwrap();

        assert_eq!(result, vec![r1]);
    }

    #[tokio::test]
    async fn test_has_rated() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[btreemap! {
                    "num_items" => Value::BigInt(Some(2)),
                }]])
                .append_query_results([[btreemap! {
                    "num_items" => Value::BigInt(Some(0)),
                }]])
                .into_connection(),
        );

        let repo = RatingRepository::new(db);
        assert!(repo.has_rated("user1", "p1").await.unwrap());
        assert!(!repo.has_rated("user2", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_rated_project_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_rating("r1", "user1", "p2", 5.0)]])
                .into_connection(),
        );

        let repo = RatingRepository::new(db);
        let ids = ["p1", "p2"].map(String::from);
        let rated = repo.rated_project_ids("user1", &ids).await.unwrap();

        assert_eq!(rated, HashSet::from(["p2".to_string()]));
    }

    #[tokio::test]
    async fn test_stats_in() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[btreemap! {
                "average" => Value::Double(Some(7.5)),
                "total" => Value::BigInt(Some(2)),
            }]])
            .into_connection();

        let stats = RatingRepository::stats_in(&db, "p1").await.unwrap();
        assert_eq!(
            stats,
            RatingStats {
                average: Some(7.5),
                total: 2,
            }
        );

        let sql = format!("{:?}", db.into_transaction_log());
        assert!(sql.contains("AVG"));
        assert!(sql.contains("COUNT"));
    }

    #[tokio::test]
    async fn test_stats_in_no_ratings() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[btreemap! {
                "average" => Value::Double(None),
                "total" => Value::BigInt(Some(0)),
            }]])
            .into_connection();

        let stats = RatingRepository::stats_in(&db, "p1").await.unwrap();
        assert_eq!(stats.average, None);
        assert_eq!(stats.total, 0);
    }
}
