//! Database entities.

#![allow(missing_docs)]

pub mod comment;
pub mod criteria;
pub mod project;
pub mod project_image;
pub mod rating;
pub mod vote;

pub use comment::Entity as Comment;
pub use criteria::Entity as Criteria;
pub use project::Entity as Project;
pub use project_image::Entity as ProjectImage;
pub use rating::Entity as Rating;
pub use vote::Entity as Vote;
