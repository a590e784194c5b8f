//! Home page sections built from the ranked pool.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::normalizer::{human_age, ItemKind, NormalizedItem};

const TOP_RIGHT: std::ops::Range<usize> = 1..4;
const SUB_CARDS: std::ops::Range<usize> = 4..6;
const LATEST: std::ops::Range<usize> = 6..18;

/// Card shape used for the hero, top-right and sub-card sections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryCard {
    pub id: String,
    pub url: String,
    pub image: String,
    pub title: String,
    pub source: String,
    pub age: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub kicker: String,
    pub tags: Vec<String>,
}

/// Reduced headline shape for the "latest" list; never carries an image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatestItem {
    pub id: String,
    pub image: String,
    pub title: String,
    pub source: String,
    pub age: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeLayout {
    pub hero: Option<StoryCard>,
    pub top_right: Vec<StoryCard>,
    pub sub_cards: Vec<StoryCard>,
    pub latest: Vec<LatestItem>,
}

impl StoryCard {
    fn from_item(item: &NormalizedItem, now: DateTime<Utc>) -> Self {
        Self {
            id: item.id.clone(),
            url: item.url.clone(),
            image: item.image.clone(),
            title: item.title.clone(),
            source: item.source.clone(),
            age: human_age(item.published_at, now),
            kind: item.kind,
            kicker: String::new(),
            tags: Vec::new(),
        }
    }

    fn hero(item: &NormalizedItem, now: DateTime<Utc>) -> Self {
        Self {
            kind: ItemKind::Hero,
            kicker: item.source.clone(),
            ..Self::from_item(item, now)
        }
    }
}

impl LatestItem {
    fn from_item(item: &NormalizedItem, now: DateTime<Utc>) -> Self {
        Self {
            id: item.id.clone(),
            image: String::new(),
            title: item.title.clone(),
            source: item.source.clone(),
            age: human_age(item.published_at, now),
            url: item.url.clone(),
        }
    }
}

fn window(pool: &[NormalizedItem], range: std::ops::Range<usize>) -> &[NormalizedItem] {
    let end = range.end.min(pool.len());
    let start = range.start.min(end);
    &pool[start..end]
}

/// Partition a ranked pool into the home sections. Ages are computed against `now`.
pub fn slice(pool: &[NormalizedItem], now: DateTime<Utc>) -> HomeLayout {
    let Some(first) = pool.first() else {
        return HomeLayout::default();
    };

    HomeLayout {
        hero: Some(StoryCard::hero(first, now)),
        top_right: window(pool, TOP_RIGHT)
            .iter()
            .map(|item| StoryCard::from_item(item, now))
            .collect(),
        sub_cards: window(pool, SUB_CARDS)
            .iter()
            .map(|item| StoryCard::from_item(item, now))
            .collect(),
        latest: window(pool, LATEST)
            .iter()
            .map(|item| LatestItem::from_item(item, now))
            .collect(),
    }
}
