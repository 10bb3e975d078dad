//! Business logic services.

#![allow(missing_docs)]

pub mod access;
pub mod comment;
pub mod comment_tree;
pub mod criteria;
pub mod identity;
pub mod image;
pub mod ordering;
pub mod project;
pub mod rating;
pub mod view;
pub mod voting;

#[cfg(test)]
mod test_support;

pub use access::{AccessControl, Caller, Operation, PolicyTable, Rule};
pub use comment::{AddCommentInput, CommentService, UpdateCommentInput};
pub use comment_tree::{CommentNode, MAX_REPLY_DEPTH, build_comment_tree};
pub use criteria::CriteriaService;
pub use identity::{IdentityProvider, JwtIdentityProvider, TrustedHeaderIdentityProvider};
pub use image::{ProjectImageService, UpdateImageInput, UploadImageInput};
pub use ordering::{DEFAULT_ORDERING, parse_ordering};
pub use project::{
    CreateProjectInput, DEFAULT_LIMIT, ListProjectsQuery, MAX_LIMIT, ProjectService,
    UpdateProjectInput,
};
pub use rating::{RatingDetail, RatingService, SubmitRatingInput, UpdateRatingInput};
pub use view::{ProjectDetail, ProjectSummary, ProjectViewService};
pub use voting::VotingService;
