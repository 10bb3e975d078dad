//! Voting engine.
//!
//! One vote per user per project. Each vote or unvote runs in a single
//! transaction that locks the project row, changes the vote row, recounts
//! the project's votes and writes the count back, so `vote_count` always
//! equals the number of vote rows once the transaction commits. Dropping the
//! future before commit (for example when the client disconnects) rolls the
//! whole thing back.

use std::sync::Arc;

use chrono::Utc;
use pitchboard_common::{AppError, AppResult, IdGenerator};
use pitchboard_db::{
    db_error,
    entities::vote,
    repositories::{ProjectRepository, VoteRepository},
};
use sea_orm::{ConnectionTrait, DatabaseConnection, Set, TransactionTrait};
use tracing::info;

use crate::services::access::{AccessControl, Caller, Operation};

/// Voting service for business logic.
#[derive(Clone)]
pub struct VotingService {
    db: Arc<DatabaseConnection>,
    vote_repo: VoteRepository,
    access: Arc<dyn AccessControl>,
    id_gen: IdGenerator,
}

impl VotingService {
    /// Create a new voting service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            vote_repo: VoteRepository::new(Arc::clone(&db)),
            db,
            access,
            id_gen: IdGenerator::new(),
        }
    }

    /// Cast the caller's vote on a published project. Returns the new vote count.
    pub async fn vote(&self, project_id: &str, caller: &Caller) -> AppResult<i32> {
        let user_id = self.access.require_user(caller, Operation::Vote)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        ProjectRepository::lock_published(&txn, project_id).await?;

        if VoteRepository::find_in(&txn, user_id, project_id)
            .await?
            .is_some()
        {
            return Err(AppError::AlreadyVoted);
        }

        let model = vote::ActiveModel {
            id: Set(self.id_gen.generate()),
            user_id: Set(user_id.to_string()),
            project_id: Set(project_id.to_string()),
            created_at: Set(Utc::now().into()),
        };
        match VoteRepository::insert_in(&txn, model).await {
            Ok(_) => {}
            // Lost a race against a concurrent vote by the same user.
            Err(AppError::ConstraintViolation(_)) => return Err(AppError::AlreadyVoted),
            Err(e) => return Err(e),
        }

        let vote_count = Self::recount(&txn, project_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(project_id = %project_id, user_id = %user_id, vote_count, "Vote cast");
        Ok(vote_count)
    }

    /// Withdraw the caller's vote. Returns the new vote count.
    pub async fn unvote(&self, project_id: &str, caller: &Caller) -> AppResult<i32> {
        let user_id = self.access.require_user(caller, Operation::Unvote)?;

        let txn = self.db.begin().await.map_err(db_error)?;
        ProjectRepository::lock_published(&txn, project_id).await?;

        let removed = VoteRepository::delete_in(&txn, user_id, project_id).await?;
        if removed == 0 {
            return Err(AppError::NotVoted);
        }

        let vote_count = Self::recount(&txn, project_id).await?;
        txn.commit().await.map_err(db_error)?;

        info!(project_id = %project_id, user_id = %user_id, vote_count, "Vote withdrawn");
        Ok(vote_count)
    }

    /// Check if a user has voted on a project.
    pub async fn has_voted(&self, project_id: &str, user_id: &str) -> AppResult<bool> {
        self.vote_repo.has_voted(user_id, project_id).await
    }

    async fn recount<C: ConnectionTrait>(conn: &C, project_id: &str) -> AppResult<i32> {
        let count = VoteRepository::count_in(conn, project_id).await?;
        let count = i32::try_from(count)
            .map_err(|_| AppError::Internal(format!("Vote count overflow: {count}")))?;
        ProjectRepository::set_vote_count(conn, project_id, count).await?;
        Ok(count)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::access::PolicyTable;
    use crate::services::test_support::{count_row, create_test_project, exec_ok};
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: DatabaseConnection) -> (VotingService, Arc<DatabaseConnection>) {
        let db = Arc::new(db);
        (
            VotingService::new(Arc::clone(&db), Arc::new(PolicyTable::default())),
            db,
        )
    }

    fn user(id: &str) -> Caller {
        Caller::User(id.to_string())
    }

    fn create_test_vote(user_id: &str, project_id: &str) -> vote::Model {
        vote::Model {
            id: "v1".to_string(),
            user_id: user_id.to_string(),
            project_id: project_id.to_string(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_vote_success_returns_recount() {
        let (service, _db) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([Vec::<vote::Model>::new()])
                .append_query_results([[create_test_vote("bob", "p1")]])
                .append_query_results([[count_row(3)]])
                .append_exec_results([exec_ok(1)])
                .into_connection(),
        );

        let count = service.vote("p1", &user("bob")).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_vote_twice_is_already_voted() {
        let (service, db) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[create_test_vote("bob", "p1")]])
                .into_connection(),
        );

        let result = service.vote("p1", &user("bob")).await;
        assert!(matches!(result, Err(AppError::AlreadyVoted)));

        // Rolled back: no insert, no counter write, no commit.
        drop(service);
        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{log:?}");
        assert!(!sql.contains("INSERT"));
        assert!(!sql.contains("UPDATE \\\"project\\\""));
        assert!(!sql.contains("COMMIT"));
    }

    #[tokio::test]
    async fn test_vote_on_missing_or_draft_project() {
        let (service, _db) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<pitchboard_db::entities::project::Model>::new()])
                .into_connection(),
        );

        let result = service.vote("draft", &user("bob")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_anonymous_vote_is_unauthenticated() {
        let (service, _db) =
            service(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let result = service.vote("p1", &Caller::Anonymous).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));

        let result = service.unvote("p1", &Caller::Anonymous).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn test_unvote_without_vote_is_not_voted() {
        let (service, _db) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_exec_results([exec_ok(0)])
                .into_connection(),
        );

        let result = service.unvote("p1", &user("bob")).await;
        assert!(matches!(result, Err(AppError::NotVoted)));
    }

    #[tokio::test]
    async fn test_unvote_success_returns_recount() {
        let (service, _db) = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[count_row(2)]])
                .append_exec_results([exec_ok(1), exec_ok(1)])
                .into_connection(),
        );

        let count = service.unvote("p1", &user("bob")).await.unwrap();
        assert_eq!(count, 2);
    }
}
