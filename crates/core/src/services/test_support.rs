//! Fixtures shared by the service unit tests.

use std::collections::BTreeMap;

use chrono::Utc;
use pitchboard_db::entities::{
    criteria,
    project::{self, Category, ProjectStatus},
};
use sea_orm::{MockExecResult, Value};

pub fn create_test_project(id: &str, creator_id: &str) -> project::Model {
    project::Model {
        id: id.to_string(),
        name: format!("Project {id}"),
        description: "A test project".to_string(),
        category: Category::App,
        creator_id: creator_id.to_string(),
        status: ProjectStatus::Published,
        is_featured: false,
        repository_link: None,
        live_link: None,
        vote_count: 0,
        average_score: 0.0,
        rating_count: 0,
        created_at: Utc::now().into(),
        updated_at: None,
    }
}

pub fn create_test_criteria(id: &str, name: &str, category: Category) -> criteria::Model {
    criteria::Model {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{name} description"),
        weight: 1.0,
        project_category: category,
        created_at: Utc::now().into(),
    }
}

/// Row returned by a `COUNT(*)` paginator query.
pub fn count_row(n: i64) -> BTreeMap<&'static str, Value> {
    maplit::btreemap! { "num_items" => Value::BigInt(Some(n)) }
}

pub const fn exec_ok(rows_affected: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected,
    }
}
