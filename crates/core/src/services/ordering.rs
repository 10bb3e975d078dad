//! Project list ordering.
//!
//! `ordering` is a comma-separated list of `created_at`, `vote_count` and
//! `average_score`, each optionally prefixed with `-` for descending order.

use pitchboard_db::entities::project;
use sea_orm::Order;

/// Ordering used when the request names no valid term.
pub const DEFAULT_ORDERING: &str = "-created_at";

/// Parse an `ordering` parameter into sort terms.
///
/// Unknown fields are skipped, as are repeats of a field already seen. If
/// nothing valid remains the result is [`DEFAULT_ORDERING`].
#[must_use]
pub fn parse_ordering(raw: Option<&str>) -> Vec<(project::Column, Order)> {
    let terms = raw.map(parse_terms).unwrap_or_default();
    if terms.is_empty() {
        parse_terms(DEFAULT_ORDERING)
    } else {
        terms
    }
}

fn parse_terms(raw: &str) -> Vec<(project::Column, Order)> {
    let mut seen: Vec<&str> = Vec::new();
    let mut terms = Vec::new();

    for term in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (field, order) = match term.strip_prefix('-') {
            Some(field) => (field, Order::Desc),
            None => (term, Order::Asc),
        };

        let column = match field {
            "created_at" => project::Column::CreatedAt,
            "vote_count" => project::Column::VoteCount,
            "average_score" => project::Column::AverageScore,
            _ => continue,
        };

        if !seen.contains(&field) {
            seen.push(field);
            terms.push((column, order));
        }
    }

    terms
}
