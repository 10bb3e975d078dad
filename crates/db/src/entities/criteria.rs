//! Criteria entity (global rating criteria, one set per project category).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::project::Category;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "criteria")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Relative weight. Reference data only; averages are unweighted.
    pub weight: f64,

    /// Category of projects this criteria applies to
    #[sea_orm(indexed)]
    pub project_category: Category,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::rating::Entity")]
    Ratings,
}

impl Related<super::rating::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ratings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether this criteria may be used to rate a project of `category`.
    #[must_use]
    pub fn applies_to(&self, category: Category) -> bool {
        self.project_category == category
    }
}
