//! Raw feed entries.
//!
//! Feeds disagree on which fields they carry, so a [`RawEntry`] keeps every
//! field optional and lets the normalizer decide on defaults.

use chrono::{DateTime, Utc};
use feed_rs::model::Entry;
use feed_rs::parser;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use reqwest::Url;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEntry {
    pub title: Option<String>,
    pub link: Option<String>,
    pub id: Option<String>,
    pub published: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub media_content: Vec<String>,
    pub media_thumbnails: Vec<String>,
    pub enclosures: Vec<String>,
    pub summary: Option<String>,
    pub content: Vec<String>,
}

/// Parse a feed document (RSS, Atom or JSON Feed) into raw entries.
///
/// Entries without a feed-provided id get an empty id rather than a
/// generated one.
pub fn parse_entries(bytes: &[u8]) -> anyhow::Result<Vec<RawEntry>> {
    let parsed = parser::Builder::new()
        .id_generator(|_, _, _| String::new())
        .build()
        .parse(bytes)?;
    let mut entries: Vec<RawEntry> = parsed.entries.into_iter().map(RawEntry::from).collect();

    // feed_rs reports RSS <enclosure> as media content
    let enclosures = rss_item_enclosures(bytes);
    if enclosures.len() == entries.len() {
        for (entry, urls) in entries.iter_mut().zip(enclosures) {
            entry.move_to_enclosures(urls);
        }
    }

    Ok(entries)
}

/// `<enclosure url="...">` values of each RSS `<item>`, in document order.
pub fn rss_item_enclosures(xml: &[u8]) -> Vec<Vec<String>> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut items: Vec<Vec<String>> = Vec::new();
    let mut in_item = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"item" => {
                items.push(Vec::new());
                in_item = true;
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"item" => {
                items.push(Vec::new());
            }
            Ok(Event::End(e)) if e.local_name().as_ref() == b"item" => {
                in_item = false;
            }
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if in_item && e.name().as_ref() == b"enclosure" =>
            {
                let url = e
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"url")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.trim().to_string()))
                    .filter(|v| !v.is_empty());
                if let (Some(url), Some(current)) = (url, items.last_mut()) {
                    current.push(url);
                }
            }
            Ok(Event::Eof) => break,
            // feed_rs already accepted the document; keep what was found
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }

    items
}

/// Canonical string form of a URL, matching how feed_rs stores media URLs.
fn canonical_url(raw: &str) -> String {
    Url::parse(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn is_enclosure(rel: Option<&str>) -> bool {
    rel.is_some_and(|r| r.eq_ignore_ascii_case("enclosure"))
}

impl RawEntry {
    fn move_to_enclosures(&mut self, urls: Vec<String>) {
        for url in urls {
            let url = canonical_url(&url);
            if let Some(pos) = self.media_content.iter().position(|m| *m == url) {
                self.media_content.remove(pos);
            }
            if !self.enclosures.contains(&url) {
                self.enclosures.push(url);
            }
        }
    }
}

impl From<Entry> for RawEntry {
    fn from(entry: Entry) -> Self {
        // The article link is the alternate link; enclosures are collected separately
        let link = entry
            .links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .map(|l| l.href.clone())
            .and_then(non_empty);

        let enclosures = entry
            .links
            .iter()
            .filter(|l| is_enclosure(l.rel.as_deref()))
            .map(|l| l.href.clone())
            .collect();

        let media_content = entry
            .media
            .iter()
            .flat_map(|m| m.content.iter())
            .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
            .collect();

        let media_thumbnails = entry
            .media
            .iter()
            .flat_map(|m| m.thumbnails.iter())
            .map(|t| t.image.uri.clone())
            .collect();

        Self {
            title: entry.title.map(|t| t.content),
            link,
            id: non_empty(entry.id),
            published: entry.published,
            updated: entry.updated,
            media_content,
            media_thumbnails,
            enclosures,
            summary: entry.summary.map(|s| s.content),
            content: entry.content.and_then(|c| c.body).into_iter().collect(),
        }
    }
}
