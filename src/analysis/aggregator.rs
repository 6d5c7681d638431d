//! Role classification and user aggregation.
//!
//! This module turns a snapshot of user records into per-role counts
//! and the normalized distribution drawn on the dashboard chart.

use crate::models::{Category, Distribution, RoleTally, UserRecord};

/// Classify a raw role value.
///
/// Matching is case-insensitive and ignores surrounding whitespace.
/// Missing and unrecognized roles fall back to [`Category::Other`].
pub fn classify(role: Option<&str>) -> Category {
    let normalized = role.unwrap_or("").trim().to_lowercase();

    Category::CHARTED
        .into_iter()
        .find(|category| category.role_key() == Some(normalized.as_str()))
        .unwrap_or(Category::Other)
}

/// Aggregate a snapshot of users into a tally and a chart distribution.
pub fn aggregate(records: &[UserRecord]) -> (RoleTally, Distribution) {
    let mut buckets = [0usize; 5];

    for record in records {
        buckets[bucket_index(classify(record.role.as_deref()))] += 1;
    }

    let tally = RoleTally::from_buckets(buckets);
    debug_assert_eq!(tally.total(), records.len());

    let distribution = Distribution::from_tally(&tally);
    debug_assert!(distribution.is_empty() || (distribution.sum() - 1.0).abs() < 1e-9);

    (tally, distribution)
}

fn bucket_index(category: Category) -> usize {
    match category {
        Category::OlderAdult => 0,
        Category::Caregiver => 1,
        Category::Family => 2,
        Category::Admin => 3,
        Category::Other => 4,
    }
}
