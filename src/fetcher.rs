use std::time::Duration;

use futures::future::join_all;
use reqwest::{redirect, Client};
use tracing::{info, warn};

use crate::config::FeedSource;
use crate::entry::{parse_entries, RawEntry};

/// Redirect hops followed before a fetch is treated as failed.
const MAX_REDIRECTS: usize = 10;

/// Build the outbound HTTP client shared by the feed fetcher and quote provider.
pub fn build_client(timeout: Duration, user_agent: &str) -> anyhow::Result<Client> {
    let client = Client::builder()
        .timeout(timeout)
        .redirect(redirect::Policy::limited(MAX_REDIRECTS))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Entries fetched from one source. Failed sources carry no entries.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub source: FeedSource,
    pub entries: Vec<RawEntry>,
}

#[derive(Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Fetch every source concurrently. One batch per source, in source order.
    pub async fn fetch_all(&self, sources: &[FeedSource]) -> Vec<SourceBatch> {
        let results = join_all(sources.iter().map(|source| async move {
            let result = self.fetch_source(source).await;
            (source, result)
        }))
        .await;

        results
            .into_iter()
            .map(|(source, result)| {
                let entries = match result {
                    Ok(entries) => {
                        info!("Fetched {} entries from '{}'", entries.len(), source.name);
                        entries
                    }
                    Err(e) => {
                        warn!("Skipping feed '{}' ({}): {:#}", source.name, source.url, e);
                        Vec::new()
                    }
                };
                SourceBatch {
                    source: source.clone(),
                    entries,
                }
            })
            .collect()
    }

    pub async fn fetch_source(&self, source: &FeedSource) -> anyhow::Result<Vec<RawEntry>> {
        let response = self
            .client
            .get(&source.url)
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        parse_entries(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
        <rss version="2.0">
            <channel>
                <title>Wire</title>
                <link>https://wire.example.com</link>
                <description>Wire</description>
                <item>
                    <title>One</title>
                    <link>https://wire.example.com/1</link>
                    <pubDate>Mon, 09 Dec 2024 12:00:00 GMT</pubDate>
                </item>
                <item>
                    <title>Two</title>
                    <link>https://wire.example.com/2</link>
                    <pubDate>Mon, 09 Dec 2024 11:00:00 GMT</pubDate>
                </item>
            </channel>
        </rss>
    "#;

    fn fetcher(timeout: Duration) -> Fetcher {
        Fetcher::new(build_client(timeout, "FetcherTest/1.0").unwrap())
    }

    fn source(server: &MockServer, name: &str, route: &str) -> FeedSource {
        FeedSource::new(name, format!("{}{}", server.uri(), route))
    }

    mod fetch_source_tests {
        use super::*;

        #[tokio::test]
        async fn test_fetch_parses_entries_and_sends_user_agent() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rss"))
                .and(header("user-agent", "FetcherTest/1.0"))
                .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
                .mount(&server)
                .await;

            let entries = fetcher(Duration::from_secs(5))
                .fetch_source(&source(&server, "Wire", "/rss"))
                .await
                .unwrap();

            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].title.as_deref(), Some("One"));
        }

        #[tokio::test]
        async fn test_non_success_status_is_error() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/rss"))
                .respond_with(ResponseTemplate::new(503).set_body_string(RSS))
                .mount(&server)
                .await;

            let result = fetcher(Duration::from_secs(5))
                .fetch_source(&source(&server, "Wire", "/rss"))
                .await;
            assert!(result.is_err());
        }

        #[tokio::test]
        async fn test_redirects_are_followed() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/old"))
                .respond_with(
                    ResponseTemplate::new(301)
                        .insert_header("location", format!("{}/rss", server.uri()).as_str()),
                )
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/rss"))
                .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
                .mount(&server)
                .await;

            let entries = fetcher(Duration::from_secs(5))
                .fetch_source(&source(&server, "Wire", "/old"))
                .await
                .unwrap();
            assert_eq!(entries.len(), 2);
        }
    }

    mod fetch_all_tests {
        use super::*;

        #[tokio::test]
        async fn test_failures_are_isolated() {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/ok"))
                .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/broken"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/garbage"))
                .respond_with(ResponseTemplate::new(200).set_body_string("{not a feed"))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/slow"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_string(RSS)
                        .set_delay(Duration::from_secs(5)),
                )
                .mount(&server)
                .await;

            let sources = vec![
                source(&server, "Broken", "/broken"),
                source(&server, "Ok", "/ok"),
                source(&server, "Garbage", "/garbage"),
                source(&server, "Slow", "/slow"),
            ];

            let batches = fetcher(Duration::from_millis(500)).fetch_all(&sources).await;

            assert_eq!(batches.len(), 4);
            let names: Vec<&str> = batches.iter().map(|b| b.source.name.as_str()).collect();
            assert_eq!(names, vec!["Broken", "Ok", "Garbage", "Slow"]);
            assert!(batches[0].entries.is_empty());
            assert_eq!(batches[1].entries.len(), 2);
            assert!(batches[2].entries.is_empty());
            assert!(batches[3].entries.is_empty());
        }

        #[tokio::test]
        async fn test_no_sources() {
            let batches = fetcher(Duration::from_secs(1)).fetch_all(&[]).await;
            assert!(batches.is_empty());
        }
    }
}
