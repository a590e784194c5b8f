use chrono::{DateTime, Utc};
use scraper::{Html, Selector};

use crate::entry::RawEntry;

/// Display role of an item in the home layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Story,
    Hero,
}

/// Canonical item shared by every feed source.
///
/// `published_at` is used for ranking only and is never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedItem {
    pub id: String,
    pub url: String,
    pub title: String,
    pub image: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub kind: ItemKind,
}

pub fn normalize(entry: &RawEntry, source_name: &str) -> NormalizedItem {
    let title = entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Untitled")
        .to_string();

    let link = entry
        .link
        .as_deref()
        .filter(|l| !l.is_empty())
        .or_else(|| entry.id.as_deref().filter(|id| !id.is_empty()))
        .unwrap_or("#")
        .to_string();

    NormalizedItem {
        id: link.clone(),
        url: link,
        title,
        image: extract_image(entry),
        source: source_name.to_string(),
        published_at: entry
            .published
            .or(entry.updated)
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        kind: ItemKind::Story,
    }
}

fn first_non_empty(urls: &[String]) -> Option<&str> {
    urls.first().map(String::as_str).filter(|u| !u.is_empty())
}

/// Resolve the item image: media content, then media thumbnail, then
/// enclosure, then the first `<img>` of the summary (or first content block).
pub fn extract_image(entry: &RawEntry) -> String {
    if let Some(url) = first_non_empty(&entry.media_content)
        .or_else(|| first_non_empty(&entry.media_thumbnails))
        .or_else(|| first_non_empty(&entry.enclosures))
    {
        return url.to_string();
    }

    let html = match entry.summary.as_deref().filter(|s| !s.is_empty()) {
        Some(summary) => summary,
        None => entry.content.first().map(String::as_str).unwrap_or_default(),
    };
    first_img_from_html(html)
}

/// Return the `src` of the first `<img>` element, or an empty string.
pub fn first_img_from_html(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }

    let Ok(selector) = Selector::parse("img") else {
        return String::new();
    };

    let fragment = Html::parse_fragment(html);
    fragment
        .select(&selector)
        .next()
        .and_then(|img| img.value().attr("src"))
        .unwrap_or_default()
        .to_string()
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("{} {} ago", n, unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}

/// Human-readable age of `published` relative to `now`.
pub fn human_age(published: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let mins = now
        .signed_duration_since(published)
        .num_seconds()
        .div_euclid(60);

    if mins < 1 {
        return "Just now".to_string();
    }
    if mins < 60 {
        return plural(mins, "minute");
    }
    let hours = mins / 60;
    if hours < 24 {
        return plural(hours, "hour");
    }
    plural(hours / 24, "day")
}
