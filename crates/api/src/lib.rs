//! HTTP API layer for pitchboard.
//!
//! - **Endpoints**: projects, votes, images, ratings, comments, criteria
//! - **Extractors**: the caller resolved by the auth middleware
//! - **Middleware**: credential resolution via the configured identity provider
//!
//! Built on Axum 0.8. Handlers stay thin: every rule lives in `pitchboard-core`.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, auth_middleware};
