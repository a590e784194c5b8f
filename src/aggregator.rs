use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::FeedSource;
use crate::fetcher::{Fetcher, SourceBatch};
use crate::layout::{slice, HomeLayout};
use crate::normalizer::normalize;
use crate::ranker::dedup_and_rank;

/// Faults that stop the whole home layout from being built.
#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("RSS upstream error: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("RSS parse error: {0}")]
    Processing(#[from] anyhow::Error),
}

/// Builds the finance home layout from the configured feeds.
pub struct Aggregator {
    fetcher: Fetcher,
    sources: Vec<FeedSource>,
}

impl Aggregator {
    pub fn new(fetcher: Fetcher, sources: Vec<FeedSource>) -> Self {
        Self { fetcher, sources }
    }

    /// Fetch every source and assemble the layout. Ages are computed once the
    /// fetches have completed.
    pub async fn home_layout(&self) -> Result<HomeLayout, AggregateError> {
        let batches = self.fetcher.fetch_all(&self.sources).await;
        Ok(build_layout(&batches, Utc::now()))
    }
}

/// Normalize, rank and slice already-fetched batches.
pub fn build_layout(batches: &[SourceBatch], now: DateTime<Utc>) -> HomeLayout {
    let items: Vec<_> = batches
        .iter()
        .flat_map(|batch| {
            batch
                .entries
                .iter()
                .map(|entry| normalize(entry, &batch.source.name))
        })
        .collect();

    if items.is_empty() {
        debug!("No entries from any source, returning empty layout");
        return HomeLayout::default();
    }

    let total = items.len();
    let pool = dedup_and_rank(items);
    info!("Ranked {} of {} entries into the home pool", pool.len(), total);

    slice(&pool, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::RawEntry;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn entry(link: &str, minutes_ago: i64) -> RawEntry {
        RawEntry {
            title: Some(format!("Headline {}", link)),
            link: Some(link.to_string()),
            published: Some(now() - Duration::minutes(minutes_ago)),
            ..Default::default()
        }
    }

    fn batch(name: &str, entries: Vec<RawEntry>) -> SourceBatch {
        SourceBatch {
            source: FeedSource::new(name, format!("https://{}.example.com/rss", name)),
            entries,
        }
    }

    mod build_layout_tests {
        use super::*;

        #[test]
        fn test_all_sources_empty() {
            let batches = vec![batch("ap", vec![]), batch("bloomberg", vec![])];
            assert_eq!(build_layout(&batches, now()), HomeLayout::default());
            assert_eq!(build_layout(&[], now()), HomeLayout::default());
        }

        #[test]
        fn test_merges_across_sources_and_dedups() {
            let batches = vec![
                batch(
                    "ap",
                    vec![entry("https://s/1", 30), entry("https://s/shared", 20)],
                ),
                batch(
                    "bloomberg",
                    vec![entry("https://s/shared", 5), entry("https://s/2", 60)],
                ),
            ];

            let layout = build_layout(&batches, now());

            let hero = layout.hero.unwrap();
            assert_eq!(hero.id, "https://s/shared");
            assert_eq!(hero.kicker, "bloomberg");
            assert_eq!(hero.age, "5 minutes ago");

            let rest: Vec<&str> = layout.top_right.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(rest, vec!["https://s/1", "https://s/2"]);
            assert!(layout.sub_cards.is_empty());
            assert!(layout.latest.is_empty());
        }

        #[test]
        fn test_large_input_fills_every_window() {
            let entries: Vec<RawEntry> = (0..100)
                .map(|i| entry(&format!("https://s/{}", i), i))
                .collect();
            let layout = build_layout(&[batch("ap", entries)], now());

            assert_eq!(layout.hero.unwrap().id, "https://s/0");
            assert_eq!(layout.top_right.len(), 3);
            assert_eq!(layout.sub_cards.len(), 2);
            assert_eq!(layout.latest.len(), 12);
            assert_eq!(layout.latest[11].id, "https://s/17");
        }
    }

    mod error_tests {
        use super::*;

        #[test]
        fn test_processing_message() {
            let err = AggregateError::from(anyhow::anyhow!("bad state"));
            assert_eq!(err.to_string(), "RSS parse error: bad state");
        }
    }
}
