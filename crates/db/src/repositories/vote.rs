//! Vote repository.

use std::collections::HashSet;
use std::sync::Arc;

use crate::db_error;
use crate::entities::{Vote, vote};
use pitchboard_common::AppResult;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter,
};

/// Vote repository for database operations.
#[derive(Clone)]
pub struct VoteRepository {
    db: Arc<DatabaseConnection>,
}

impl VoteRepository {
    /// Create a new vote repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Check if a user has voted on a project.
    pub async fn has_voted(&self, user_id: &str, project_id: &str) -> AppResult<bool> {
        Ok(Self::find_in(self.db.as_ref(), user_id, project_id)
            .await?
            .is_some())
    }

    /// Of `project_ids`, the ones `user_id` has voted on.
    pub async fn voted_project_ids(
        &self,
        user_id: &str,
        project_ids: &[String],
    ) -> AppResult<HashSet<String>> {
        if project_ids.is_empty() {
            return Ok(HashSet::new());
        }

        let votes = Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::ProjectId.is_in(project_ids.iter().cloned()))
            .all(self.db.as_ref())
            .await
            .map_err(db_error)?;

        Ok(votes.into_iter().map(|v| v.project_id).collect())
    }

    // === Transaction-scoped operations ===

    /// Find the vote a user cast on a project.
    pub async fn find_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        project_id: &str,
    ) -> AppResult<Option<vote::Model>> {
        Vote::find()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::ProjectId.eq(project_id))
            .one(conn)
            .await
            .map_err(db_error)
    }

    /// Insert a vote. A duplicate (user, project) pair surfaces as
    /// `AppError::ConstraintViolation`.
    pub async fn insert_in<C: ConnectionTrait>(
        conn: &C,
        model: vote::ActiveModel,
    ) -> AppResult<vote::Model> {
        model.insert(conn).await.map_err(db_error)
    }

    /// Delete the vote a user cast on a project. Returns the number of rows removed.
    pub async fn delete_in<C: ConnectionTrait>(
        conn: &C,
        user_id: &str,
        project_id: &str,
    ) -> AppResult<u64> {
        let result = Vote::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::ProjectId.eq(project_id))
            .exec(conn)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected)
    }

    /// Count votes on a project.
    pub async fn count_in<C: ConnectionTrait>(conn: &C, project_id: &str) -> AppResult<u64> {
        Vote::find()
            .filter(vote::Column::ProjectId.eq(project_id))
            .count(conn)
            .await
            .map_err(db_error)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_vote(id: &str, user_id: &str, project_id: &str) -> vote::Model {
        vote::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_has_voted() {
        let vote = create_test_vote("v1", "user1", "p1");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .append_query_results([Vec::<vote::Model>::new()])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        assert!(repo.has_voted("user1", "p1").await.unwrap());
        assert!(!repo.has_voted("user2", "p1").await.unwrap());
    }

    #[tokio::test]
    async fn test_voted_project_ids() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[
                    create_test_vote("v1", "user1", "p1"),
                    create_test_vote("v2", "user1", "p3"),
                ]])
                .into_connection(),
        );

        let repo = VoteRepository::new(db);
        let ids = ["p1", "p2", "p3"].map(String::from);
        let voted = repo.voted_project_ids("user1", &ids).await.unwrap();

        assert_eq!(voted.len(), 2);
        assert!(voted.contains("p1"));
        assert!(voted.contains("p3"));
    }

    #[tokio::test]
    async fn test_voted_project_ids_empty_input_skips_query() {
        // No query results appended: any query would fail.
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = VoteRepository::new(db);
        let voted = repo.voted_project_ids("user1", &[]).await.unwrap();
        assert!(voted.is_empty());
    }

    #[tokio::test]
    async fn test_delete_in_reports_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let removed = VoteRepository::delete_in(&db, "user1", "p1").await.unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_count_in() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[maplit::btreemap! {
                "num_items" => sea_orm::Value::BigInt(Some(3)),
            }]])
            .into_connection();

        let count = VoteRepository::count_in(&db, "p1").await.unwrap();
        assert_eq!(count, 3);
    }
}
