//! Data categories and their time-to-live policy.
//!
//! Every cached value belongs to exactly one [`Category`]. The TTL of an entry
//! is fixed by the category it belongs to and cannot be configured per
//! instance:
//!
//! | Kind | Categories | TTL |
//! |------|------------|-----|
//! | [`CategoryKind::HomeAggregate`] | `home` | 5 min |
//! | [`CategoryKind::SectionList`] | `popular`, `ongoing`, `completed`, `latest` | 5 min |
//! | [`CategoryKind::Taxonomy`] | `genres` | 10 min |
//! | [`CategoryKind::WeeklyRanked`] | `weekly_ranking` | 15 min |
//!
//! [`REFRESH_HORIZON`] is the interval after which the auto-refresh loop
//! re-checks every category.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const MINUTE: u64 = 60;

/// Time after the last successful full load at which auto-refresh kicks in.
pub const REFRESH_HORIZON: Duration = Duration::from_secs(30 * MINUTE);

/// A named class of cached catalog content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Aggregated home page feed.
    Home,
    /// Most popular stories.
    Popular,
    /// Stories still being published.
    Ongoing,
    /// Finished stories.
    Completed,
    /// Recently updated stories.
    Latest,
    /// Genre taxonomy.
    Genres,
    /// Stories ranked by views over the last week.
    WeeklyRanking,
}

/// Grouping of categories sharing a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryKind {
    /// The home aggregate.
    HomeAggregate,
    /// Paginated per-section story lists.
    SectionList,
    /// Category/taxonomy listings.
    Taxonomy,
    /// Weekly-ranked stories.
    WeeklyRanked,
}

impl CategoryKind {
    /// TTL applied to every entry of this kind.
    pub const fn ttl(self) -> Duration {
        match self {
            CategoryKind::HomeAggregate | CategoryKind::SectionList => {
                Duration::from_secs(5 * MINUTE)
            }
            CategoryKind::Taxonomy => Duration::from_secs(10 * MINUTE),
            CategoryKind::WeeklyRanked => Duration::from_secs(15 * MINUTE),
        }
    }
}

impl Category {
    /// All categories, in a stable order.
    pub const ALL: [Category; 7] = [
        Category::Home,
        Category::Popular,
        Category::Ongoing,
        Category::Completed,
        Category::Latest,
        Category::Genres,
        Category::WeeklyRanking,
    ];

    /// Identifier used in cache keys and payload tags.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Category::Home => "home",
            Category::Popular => "popular",
            Category::Ongoing => "ongoing",
            Category::Completed => "completed",
            Category::Latest => "latest",
            Category::Genres => "genres",
            Category::WeeklyRanking => "weekly_ranking",
        }
    }

    /// Kind of this category.
    pub const fn kind(&self) -> CategoryKind {
        match self {
            Category::Home => CategoryKind::HomeAggregate,
            Category::Popular | Category::Ongoing | Category::Completed | Category::Latest => {
                CategoryKind::SectionList
            }
            Category::Genres => CategoryKind::Taxonomy,
            Category::WeeklyRanking => CategoryKind::WeeklyRanked,
        }
    }

    /// TTL of entries in this category.
    pub const fn ttl(&self) -> Duration {
        self.kind().ttl()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when parsing an identifier that names no category.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data category `{0}`")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_owned()))
    }
}
