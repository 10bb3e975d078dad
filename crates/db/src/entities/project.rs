//! Project entity (user-submitted projects that are voted on and rated).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Project category. Restricts which criteria apply to a project.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "poll")]
    Poll,
    #[sea_orm(string_value = "app")]
    App,
    #[sea_orm(string_value = "web")]
    Web,
    #[sea_orm(string_value = "game")]
    Game,
    #[sea_orm(string_value = "hardware")]
    Hardware,
    #[sea_orm(string_value = "other")]
    Other,
}

impl Category {
    /// Human readable name, used in responses and error messages.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Poll => "Poll",
            Self::App => "App",
            Self::Web => "Website",
            Self::Game => "Game",
            Self::Hardware => "Hardware",
            Self::Other => "Other",
        }
    }
}

/// Publication status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[sea_orm(string_value = "draft")]
    Draft,
    #[default]
    #[sea_orm(string_value = "published")]
    Published,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "project")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    #[sea_orm(indexed)]
    pub category: Category,

    /// Owning user ID (opaque, issued by the identity provider)
    #[sea_orm(indexed)]
    pub creator_id: String,

    pub status: ProjectStatus,

    pub is_featured: bool,

    #[sea_orm(nullable)]
    pub repository_link: Option<String>,

    #[sea_orm(nullable)]
    pub live_link: Option<String>,

    /// Number of vote rows (denormalized, recomputed transactionally)
    #[sea_orm(default_value = 0)]
    pub vote_count: i32,

    /// Mean of all rating scores (denormalized)
    pub average_score: f64,

    /// Number of rating rows (denormalized)
    #[sea_orm(default_value = 0)]
    pub rating_count: i32,

    pub created_at: DateTimeWithTimeZone,

    #[sea_orm(nullable)]
    pub updated_at: Option<DateTimeWithTimeZone>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::project_image::Entity")]
    Images,
    #[sea_orm(has_many = "super::vote::Entity")]
    Votes,
    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::project_image::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::vote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Votes.def()
    }
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether `user_id` owns this project.
    #[must_use]
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_display_names() {
        assert_eq!(Category::Poll.display_name(), "Poll");
        assert_eq!(Category::Web.display_name(), "Website");
    }

    #[test]
    fn test_category_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Category::Hardware).ok().as_deref(),
            Some("\"hardware\"")
        );
        let parsed: Result<Category, _> = serde_json::from_str("\"app\"");
        assert_eq!(parsed.ok(), Some(Category::App));
    }

    #[test]
    fn test_status_default_is_published() {
        assert_eq!(ProjectStatus::default(), ProjectStatus::Published);
    }
}
