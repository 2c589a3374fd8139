//! Cached payloads.
//!
//! Everything the cache may hold is a [`CachedPayload`]: a union tagged with
//! the [`Category`] it belongs to. The tag is part of the serialized form,
//! which lets the durable tier reject a record whose shape does not match the
//! category its key names instead of trusting whatever deserializes.
//!
//! ```json
//! {"category": "popular", "data": {"items": [...], "pagination": {...}}}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::category::Category;

/// Publication status of a story.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoryStatus {
    /// Chapters are still being released.
    #[default]
    Ongoing,
    /// The story is finished.
    Completed,
    /// Publication is paused.
    Hiatus,
}

/// A catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    /// Catalog identifier.
    pub id: u64,
    /// URL slug.
    pub slug: String,
    /// Display title.
    pub title: String,
    /// Author name, if known.
    #[serde(default)]
    pub author: Option<String>,
    /// Cover image location.
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Publication status.
    #[serde(default)]
    pub status: StoryStatus,
    /// Genre slugs.
    #[serde(default)]
    pub genres: Vec<String>,
    /// Number of published chapters.
    #[serde(default)]
    pub chapter_count: u32,
    /// Lifetime view count.
    #[serde(default)]
    pub view_count: u64,
    /// Average rating, if rated.
    #[serde(default)]
    pub rating: Option<f32>,
    /// Last chapter release.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Story {
    /// Minimal story with the given id, slug and title.
    pub fn new(id: u64, slug: impl Into<String>, title: impl Into<String>) -> Self {
        Story {
            id,
            slug: slug.into(),
            title: title.into(),
            author: None,
            cover_url: None,
            status: StoryStatus::default(),
            genres: Vec::new(),
            chapter_count: 0,
            view_count: 0,
            rating: None,
            updated_at: None,
        }
    }
}

/// Pagination metadata returned with a story list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Current page, starting at 1.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of items across all pages.
    pub total: u64,
    /// Last available page.
    pub last_page: u32,
}

impl Pagination {
    /// Whether a page follows this one.
    pub fn has_next(&self) -> bool {
        self.page < self.last_page
    }
}

/// One page of a story list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryPage {
    /// Stories on this page.
    pub items: Vec<Story>,
    /// Pagination metadata.
    pub pagination: Pagination,
}

/// A genre of the taxonomy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    /// Catalog identifier.
    pub id: u64,
    /// URL slug.
    pub slug: String,
    /// Display name.
    pub name: String,
    /// Number of stories tagged with it.
    #[serde(default)]
    pub story_count: u64,
}

/// A story in the weekly ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedStory {
    /// Position, starting at 1.
    pub rank: u32,
    /// Views over the ranking week.
    pub weekly_views: u64,
    /// The ranked story.
    pub story: Story,
}

/// Aggregated home page sections.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HomeFeed {
    /// Editorially featured stories.
    #[serde(default)]
    pub featured: Vec<Story>,
    /// Popular stories.
    #[serde(default)]
    pub popular: Vec<Story>,
    /// Recently updated stories.
    #[serde(default)]
    pub latest: Vec<Story>,
    /// Recently completed stories.
    #[serde(default)]
    pub completed: Vec<Story>,
}

/// Cached value of one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", content = "data", rename_all = "snake_case")]
pub enum CachedPayload {
    /// Home aggregate.
    Home(HomeFeed),
    /// A page of popular stories.
    Popular(StoryPage),
    /// A page of ongoing stories.
    Ongoing(StoryPage),
    /// A page of completed stories.
    Completed(StoryPage),
    /// A page of recently updated stories.
    Latest(StoryPage),
    /// The genre taxonomy.
    Genres(Vec<Genre>),
    /// The weekly ranking.
    WeeklyRanking(Vec<RankedStory>),
}

impl CachedPayload {
    /// Category this payload belongs to.
    pub fn category(&self) -> Category {
        match self {
            CachedPayload::Home(_) => Category::Home,
            CachedPayload::Popular(_) => Category::Popular,
            CachedPayload::Ongoing(_) => Category::Ongoing,
            CachedPayload::Completed(_) => Category::Completed,
            CachedPayload::Latest(_) => Category::Latest,
            CachedPayload::Genres(_) => Category::Genres,
            CachedPayload::WeeklyRanking(_) => Category::WeeklyRanking,
        }
    }

    /// Number of catalog items carried.
    pub fn item_count(&self) -> usize {
        match self {
            CachedPayload::Home(feed) => {
                feed.featured.len() + feed.popular.len() + feed.latest.len() + feed.completed.len()
            }
            CachedPayload::Popular(page)
            | CachedPayload::Ongoing(page)
            | CachedPayload::Completed(page)
            | CachedPayload::Latest(page) => page.items.len(),
            CachedPayload::Genres(genres) => genres.len(),
            CachedPayload::WeeklyRanking(ranking) => ranking.len(),
        }
    }

    /// Whether the payload carries no item.
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Story page of a section-list payload.
    pub fn as_story_page(&self) -> Option<&StoryPage> {
        match self {
            CachedPayload::Popular(page)
            | CachedPayload::Ongoing(page)
            | CachedPayload::Completed(page)
            | CachedPayload::Latest(page) => Some(page),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(items: Vec<Story>) -> StoryPage {
        StoryPage {
            pagination: Pagination {
                page: 1,
                per_page: 20,
                total: items.len() as u64,
                last_page: 1,
            },
            items,
        }
    }

    #[test]
    fn tag_is_category_identifier() {
        let payloads = [
            CachedPayload::Home(HomeFeed::default()),
            CachedPayload::Popular(page(vec![])),
            CachedPayload::Ongoing(page(vec![])),
            CachedPayload::Completed(page(vec![])),
            CachedPayload::Latest(page(vec![])),
            CachedPayload::Genres(vec![]),
            CachedPayload::WeeklyRanking(vec![]),
        ];
        for payload in payloads {
            let value = serde_json::to_value(&payload).unwrap();
            assert_eq!(value["category"], payload.category().as_str());
        }
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let json = r#"{"category": "genres", "data": {"items": [], "pagination": null}}"#;
        assert!(serde_json::from_str::<CachedPayload>(json).is_err());
        let json = r#"{"category": "nope", "data": []}"#;
        assert!(serde_json::from_str::<CachedPayload>(json).is_err());
    }

    #[test]
    fn emptiness_counts_items() {
        assert!(CachedPayload::Home(HomeFeed::default()).is_empty());
        let popular = CachedPayload::Popular(page(vec![Story::new(1, "a", "A")]));
        assert!(!popular.is_empty());
        assert_eq!(popular.item_count(), 1);
        assert!(popular.as_story_page().is_some());
        assert!(CachedPayload::Genres(vec![]).as_story_page().is_none());
    }
}
