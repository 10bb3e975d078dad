//! Read models for projects.
//!
//! List entries carry the project, its counters, the caller's vote/rating
//! flags and its images. The detail view adds every rating with its
//! criteria, the criteria that apply to the project, and the comment tree.

use std::sync::Arc;

use pitchboard_common::{AppError, AppResult};
use pitchboard_db::{
    entities::{criteria, project, project_image},
    repositories::{
        CriteriaRepository, ProjectImageRepository, ProjectRepository, RatingRepository,
        VoteRepository,
    },
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

use crate::services::access::{AccessControl, Caller, Operation};
use crate::services::comment::CommentService;
use crate::services::comment_tree::CommentNode;
use crate::services::project::ensure_visible;
use crate::services::rating::{RatingDetail, RatingService};
use crate::services::voting::VotingService;

/// A project as shown in lists.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    #[serde(flatten)]
    pub project: project::Model,
    pub category_display: &'static str,
    pub has_voted: bool,
    pub has_rated: bool,
    pub images: Vec<project_image::Model>,
}

/// A project with everything attached to it.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub summary: ProjectSummary,
    pub ratings: Vec<RatingDetail>,
    pub criteria: Vec<criteria::Model>,
    pub comments: Vec<CommentNode>,
}

/// Assembles project read models.
#[derive(Clone)]
pub struct ProjectViewService {
    project_repo: ProjectRepository,
    image_repo: ProjectImageRepository,
    vote_repo: VoteRepository,
    rating_repo: RatingRepository,
    criteria_repo: CriteriaRepository,
    voting_service: VotingService,
    rating_service: RatingService,
    comment_service: CommentService,
    access: Arc<dyn AccessControl>,
}

impl ProjectViewService {
    /// Create a new project view service.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, access: Arc<dyn AccessControl>) -> Self {
        Self {
            project_repo: ProjectRepository::new(Arc::clone(&db)),
            image_repo: ProjectImageRepository::new(Arc::clone(&db)),
            vote_repo: VoteRepository::new(Arc::clone(&db)),
            rating_repo: RatingRepository::new(Arc::clone(&db)),
            criteria_repo: CriteriaRepository::new(Arc::clone(&db)),
            voting_service: VotingService::new(Arc::clone(&db), Arc::clone(&access)),
            rating_service: RatingService::new(Arc::clone(&db), Arc::clone(&access)),
            comment_service: CommentService::new(db, Arc::clone(&access)),
            access,
        }
    }

    /// Full detail view of one project.
    pub async fn detail(&self, project_id: &str, caller: &Caller) -> AppResult<ProjectDetail> {
        self.access.authorize(caller, Operation::ReadProject, None)?;
        let project = self.project_repo.get_by_id(project_id).await?;
        ensure_visible(&project, caller)?;

        let (has_voted, has_rated) = match caller.user_id() {
            Some(user_id) => (
                self.voting_service.has_voted(project_id, user_id).await?,
                self.rating_service.has_rated(project_id, user_id).await?,
            ),
            None => (false, false),
        };
        let images = self.image_repo.find_by_project(project_id).await?;

        let ratings = self.rating_repo.find_by_project(project_id).await?;
        let ratings = self.rating_service.with_criteria(ratings).await?;
        let criteria = self.criteria_repo.list(Some(project.category)).await?;
        let comments = self.comment_service.tree(project_id).await?;

        Ok(ProjectDetail {
            summary: ProjectSummary {
                category_display: project.category.display_name(),
                project,
                has_voted,
                has_rated,
                images,
            },
            ratings,
            criteria,
            comments,
        })
    }

    /// List entries for a page of projects.
    ///
    /// Vote flags, rating flags and images are each fetched with one query
    /// for the whole page.
    pub async fn summarize(
        &self,
        projects: Vec<project::Model>,
        caller: &Caller,
    ) -> AppResult<Vec<ProjectSummary>> {
        let ids: Vec<String> = projects.iter().map(|p| p.id.clone()).collect();

        let (voted, rated) = match caller.user_id() {
            Some(user_id) => (
                self.vote_repo.voted_project_ids(user_id, &ids).await?,
                self.rating_repo.rated_project_ids(user_id, &ids).await?,
            ),
            None => Default::default(),
        };
        let mut images = self.image_repo.find_by_projects(&ids).await?;

        Ok(projects
            .into_iter()
            .map(|project| ProjectSummary {
                category_display: project.category.display_name(),
                has_voted: voted.contains(&project.id),
                has_rated: rated.contains(&project.id),
                images: images.remove(&project.id).unwrap_or_default(),
                project,
            })
            .collect())
    }

    /// List entry for a single project.
    pub async fn summary(
        &self,
        project: project::Model,
        caller: &Caller,
    ) -> AppResult<ProjectSummary> {
        let id = project.id.clone();
        self.summarize(vec![project], caller)
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound(format!("Project: {id}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::access::PolicyTable;
    use crate::services::test_support::{count_row, create_test_criteria, create_test_project};
    use chrono::Utc;
    use pitchboard_db::entities::{
        comment,
        project::{Category, ProjectStatus},
        rating, vote,
    };
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn service(db: DatabaseConnection) -> ProjectViewService {
        ProjectViewService::new(Arc::new(db), Arc::new(PolicyTable::default()))
    }

    fn user(id: &str) -> Caller {
        Caller::User(id.to_string())
    }

    fn image(id: &str, project_id: &str) -> project_image::Model {
        project_image::Model {
            id: id.to_string(),
            project_id: project_id.to_string(),
            image: format!("{project_id}/{id}.png"),
            url: format!("/media/{project_id}/{id}.png"),
            caption: None,
            order: 0,
            created_at: Utc::now().into(),
        }
    }

    fn comment(id: &str, parent_id: Option<&str>) -> comment::Model {
        comment::Model {
            id: id.to_string(),
            project_id: "p1".to_string(),
            user_id: "carol".to_string(),
            content: format!("comment {id}"),
            parent_id: parent_id.map(String::from),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_detail_for_anonymous() {
        let rating = rating::Model {
            id: "r1".to_string(),
            user_id: "bob".to_string(),
            project_id: "p1".to_string(),
            criteria_id: "c1".to_string(),
            score: 8.0,
            created_at: Utc::now().into(),
            updated_at: None,
        };
        let usability = create_test_criteria("c1", "Usability", Category::App);

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[image("i1", "p1")]])
                .append_query_results([[rating]])
                .append_query_results([[usability.clone()]])
                .append_query_results([[usability]])
                .append_query_results([[comment("a", None), comment("b", Some("a"))]])
                .into_connection(),
        );

        let detail = service.detail("p1", &Caller::Anonymous).await.unwrap();
        assert!(!detail.summary.has_voted);
        assert!(!detail.summary.has_rated);
        assert_eq!(detail.summary.category_display, "App");
        assert_eq!(detail.summary.images.len(), 1);
        assert_eq!(detail.ratings.len(), 1);
        assert_eq!(detail.ratings[0].criteria.name, "Usability");
        assert_eq!(detail.criteria.len(), 1);
        assert_eq!(detail.comments.len(), 1);
        assert_eq!(detail.comments[0].replies.len(), 1);
    }

    #[tokio::test]
    async fn test_detail_flags_for_user() {
        let vote = vote::Model {
            id: "v1".to_string(),
            user_id: "bob".to_string(),
            project_id: "p1".to_string(),
            created_at: Utc::now().into(),
        };

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[create_test_project("p1", "alice")]])
                .append_query_results([[vote]])
                .append_query_results([[count_row(0)]])
                .append_query_results([Vec::<project_image::Model>::new()])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_query_results([Vec::<criteria::Model>::new()])
                .append_query_results([Vec::<comment::Model>::new()])
                .into_connection(),
        );

        let detail = service.detail("p1", &user("bob")).await.unwrap();
        assert!(detail.summary.has_voted);
        assert!(!detail.summary.has_rated);
        assert!(detail.comments.is_empty());
    }

    #[tokio::test]
    async fn test_detail_hides_drafts_from_others() {
        let mut draft = create_test_project("p1", "alice");
        draft.status = ProjectStatus::Draft;

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[draft]])
                .into_connection(),
        );

        assert!(matches!(
            service.detail("p1", &user("bob")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_summarize_batches_flags_and_images() {
        let vote = vote::Model {
            id: "v1".to_string(),
            user_id: "bob".to_string(),
            project_id: "p2".to_string(),
            created_at: Utc::now().into(),
        };

        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[vote]])
                .append_query_results([Vec::<rating::Model>::new()])
                .append_query_results([[image("i1", "p1"), image("i2", "p1")]])
                .into_connection(),
        );

        let summaries = service
            .summarize(
                vec![
                    create_test_project("p1", "alice"),
                    create_test_project("p2", "alice"),
                ],
                &user("bob"),
            )
            .await
            .unwrap();

        assert_eq!(summaries.len(), 2);
        assert!(!summaries[0].has_voted);
        assert_eq!(summaries[0].images.len(), 2);
        assert!(summaries[1].has_voted);
        assert!(summaries[1].images.is_empty());
    }

    #[tokio::test]
    async fn test_summary_serializes_flat() {
        let service = service(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<project_image::Model>::new()])
                .into_connection(),
        );

        let summary = service
            .summary(create_test_project("p1", "alice"), &Caller::Anonymous)
            .await
            .unwrap();
        let json = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["id"], "p1");
        assert_eq!(json["category"], "app");
        assert_eq!(json["category_display"], "App");
        assert_eq!(json["vote_count"], 0);
        assert_eq!(json["has_voted"], false);
    }
}
