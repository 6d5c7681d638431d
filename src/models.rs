//! Data models for the dashboard statistics.
//!
//! This module contains the core data structures used throughout
//! the application for representing users, role tallies, distributions,
//! and the generated dashboard report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role category a user account is classified into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Older adults receiving care
    OlderAdult,
    /// Professional or volunteer caregivers
    Caregiver,
    /// Family members of an older adult
    Family,
    /// Platform administrators
    Admin,
    /// Anything that does not match a known role
    Other,
}

impl Category {
    /// Every category, in bucket order.
    pub const ALL: [Category; 5] = [
        Category::OlderAdult,
        Category::Caregiver,
        Category::Family,
        Category::Admin,
        Category::Other,
    ];

    /// Categories that appear in the distribution chart, in legend order.
    pub const CHARTED: [Category; 4] = [
        Category::OlderAdult,
        Category::Caregiver,
        Category::Family,
        Category::Admin,
    ];

    /// Returns the role key stored on user documents.
    pub fn role_key(&self) -> Option<&'static str> {
        match self {
            Category::OlderAdult => Some("older_adult"),
            Category::Caregiver => Some("caregiver"),
            Category::Family => Some("family"),
            Category::Admin => Some("admin"),
            Category::Other => None,
        }
    }

    /// Returns the label shown in the chart legend.
    pub fn legend_label(&self) -> &'static str {
        match self {
            Category::OlderAdult => "Old Adults",
            Category::Caregiver => "Caregivers",
            Category::Family => "Family",
            Category::Admin => "Admins",
            Category::Other => "Unclassified",
        }
    }

    /// Returns the chart colour as a hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Category::OlderAdult => "#8A63E9",
            Category::Caregiver => "#FF9680",
            Category::Family => "#40CFC2",
            Category::Admin => "#E91E63",
            Category::Other => "#9E9E9E",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::OlderAdult => write!(f, "Older Adult"),
            Category::Caregiver => write!(f, "Caregiver"),
            Category::Family => write!(f, "Family"),
            Category::Admin => write!(f, "Admin"),
            Category::Other => write!(f, "Other"),
        }
    }
}

/// A user document as returned by the user directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Raw role text. `None` when absent or stored with a non-text type.
    #[serde(default)]
    pub role: Option<String>,
}

/// Raw per-category counts plus the overall total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleTally {
    total: usize,
    counts: BTreeMap<Category, usize>,
}

impl RoleTally {
    /// Builds a tally from counts indexed like [`Category::ALL`].
    pub(crate) fn from_buckets(buckets: [usize; 5]) -> Self {
        let counts = Category::ALL.into_iter().zip(buckets).collect();
        Self {
            total: buckets.iter().sum(),
            counts,
        }
    }

    /// Number of records aggregated, unclassified ones included.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Count for a single category.
    pub fn count(&self, category: Category) -> usize {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// All five category counts.
    pub fn counts(&self) -> &BTreeMap<Category, usize> {
        &self.counts
    }

    /// Sum of the charted categories (everything except `Other`).
    pub fn classified_total(&self) -> usize {
        Category::CHARTED.iter().map(|c| self.count(*c)).sum()
    }
}

/// Fractional share of each charted category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Distribution {
    older_adult: f64,
    caregiver: f64,
    family: f64,
    admin: f64,
}

impl Distribution {
    /// Derives the distribution from a tally.
    ///
    /// All fractions are `0.0` when no record was classified.
    pub fn from_tally(tally: &RoleTally) -> Self {
        let classified = tally.classified_total();
        if classified == 0 {
            return Self::default();
        }

        let share = |category| tally.count(category) as f64 / classified as f64;
        Self {
            older_adult: share(Category::OlderAdult),
            caregiver: share(Category::Caregiver),
            family: share(Category::Family),
            admin: share(Category::Admin),
        }
    }

    /// Fraction for a category. `Other` is never charted and always yields `0.0`.
    pub fn fraction(&self, category: Category) -> f64 {
        match category {
            Category::OlderAdult => self.older_adult,
            Category::Caregiver => self.caregiver,
            Category::Family => self.family,
            Category::Admin => self.admin,
            Category::Other => 0.0,
        }
    }

    /// Iterates over the charted categories in legend order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, f64)> + '_ {
        Category::CHARTED.into_iter().map(move |c| (c, self.fraction(c)))
    }

    /// Sum of the four fractions.
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, f)| f).sum()
    }

    /// True when no category has a share, i.e. there is nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, f)| f == 0.0)
    }
}

/// One arc of the user distribution pie chart, in degrees.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSlice {
    pub category: Category,
    pub color: String,
    pub start_angle: f64,
    pub sweep_angle: f64,
}

/// One row of the chart legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub category: Category,
    pub label: String,
    pub color: String,
    /// Percentage text with one decimal, e.g. `42.9%`.
    pub percentage: String,
}

/// Metadata about the dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    /// Directory the users were fetched from.
    pub source: String,
    /// Date and time the report was generated.
    pub generated_at: DateTime<Utc>,
    /// Time spent fetching users, in seconds.
    pub fetch_seconds: f64,
}

/// The complete admin dashboard report.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    /// Metadata about the report.
    pub metadata: ReportMetadata,
    /// Report heading.
    pub title: String,
    /// Raw per-role counts.
    pub tally: RoleTally,
    /// Normalized chart distribution.
    pub distribution: Distribution,
    /// Chart legend rows.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendEntry>,
    /// Pie chart arcs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub slices: Vec<ChartSlice>,
}
