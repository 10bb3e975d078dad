//! Database repositories.

mod comment;
mod criteria;
mod project;
mod project_image;
mod rating;
mod vote;

pub use comment::CommentRepository;
pub use criteria::CriteriaRepository;
pub use project::{ProjectFilter, ProjectRepository};
pub use project_image::ProjectImageRepository;
pub use rating::{RatingRepository, RatingStats};
pub use vote::VoteRepository;
