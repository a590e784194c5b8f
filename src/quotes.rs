//! Stock quotes with a three-tier fallback chain.
//!
//! Providers expose three views of a symbol of decreasing speed and
//! increasing reliability. [`resolve_price`] walks them in order and fills
//! whatever fields are still missing; a failing tier is skipped, never
//! surfaced.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Price fields as reported by one tier. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSnapshot {
    pub last: Option<f64>,
    pub prev_close: Option<f64>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}

impl PriceSnapshot {
    fn is_complete(&self) -> bool {
        self.last.is_some()
            && self.prev_close.is_some()
            && self.exchange.is_some()
            && self.currency.is_some()
    }

    fn fill_missing(&mut self, other: PriceSnapshot) {
        self.last = self.last.or(other.last);
        self.prev_close = self.prev_close.or(other.prev_close);
        self.exchange = self.exchange.take().or(other.exchange);
        self.currency = self.currency.take().or(other.currency);
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    /// Cheap snapshot; usually complete for plain equities.
    async fn fast_info(&self, symbol: &str) -> anyhow::Result<PriceSnapshot>;

    /// Bulk info record.
    async fn info(&self, symbol: &str) -> anyhow::Result<PriceSnapshot>;

    /// Recent daily closes, oldest first, gaps removed.
    async fn recent_closes(&self, symbol: &str) -> anyhow::Result<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub price: Option<f64>,
    pub prev_close: Option<f64>,
    pub change: Option<f64>,
    pub percent: Option<f64>,
    pub exchange: Option<String>,
    pub currency: Option<String>,
}

impl Quote {
    pub fn from_snapshot(symbol: &str, snapshot: PriceSnapshot) -> Self {
        let change = match (snapshot.last, snapshot.prev_close) {
            (Some(last), Some(prev)) => Some(last - prev),
            _ => None,
        };
        let percent = match (change, snapshot.prev_close) {
            (Some(chg), Some(prev)) if prev != 0.0 => Some(chg / prev * 100.0),
            _ => None,
        };

        Self {
            symbol: symbol.to_string(),
            price: snapshot.last,
            prev_close: snapshot.prev_close,
            change,
            percent,
            exchange: snapshot.exchange,
            currency: snapshot.currency,
        }
    }
}

/// Split a comma-separated symbol list, dropping blanks.
pub fn parse_symbols(symbols: &str) -> Vec<String> {
    symbols
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

pub async fn resolve_price(provider: &dyn QuoteProvider, symbol: &str) -> PriceSnapshot {
    let mut snapshot = match provider.fast_info(symbol).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            debug!("fast info unavailable for {}: {:#}", symbol, e);
            PriceSnapshot::default()
        }
    };

    if !snapshot.is_complete() {
        match provider.info(symbol).await {
            Ok(info) => snapshot.fill_missing(info),
            Err(e) => debug!("info unavailable for {}: {:#}", symbol, e),
        }
    }

    if snapshot.last.is_none() || snapshot.prev_close.is_none() {
        match provider.recent_closes(symbol).await {
            Ok(closes) => {
                if snapshot.last.is_none() {
                    snapshot.last = closes.last().copied();
                }
                if snapshot.prev_close.is_none() && closes.len() >= 2 {
                    snapshot.prev_close = Some(closes[closes.len() - 2]);
                }
            }
            Err(e) => debug!("history unavailable for {}: {:#}", symbol, e),
        }
    }

    snapshot
}

/// Resolve every symbol in order. Unresolvable symbols yield rows of nulls.
pub async fn get_quotes(provider: &dyn QuoteProvider, symbols: &[String]) -> Vec<Quote> {
    let mut quotes = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        let snapshot = resolve_price(provider, symbol).await;
        quotes.push(Quote::from_snapshot(symbol, snapshot));
    }
    quotes
}

/// Quote provider backed by the Yahoo Finance chart and quote APIs.
pub struct YahooQuotes {
    client: Client,
    base_url: String,
}

impl YahooQuotes {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> anyhow::Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json(&self, url: Url, query: &[(&str, &str)]) -> anyhow::Result<Value> {
        let value = self
            .client
            .get(url)
            .query(query)
            .send()
            .await?
            .error_for_status()?
            .json::<Value>()
            .await?;
        Ok(value)
    }

    async fn chart(&self, symbol: &str, range: &str) -> anyhow::Result<Value> {
        let url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        self.get_json(url, &[("range", range), ("interval", "1d")]).await
    }
}

fn number(value: &Value, pointer: &str) -> Option<f64> {
    value.pointer(pointer).and_then(Value::as_f64)
}

fn text(value: &Value, pointer: &str) -> Option<String> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

#[async_trait]
impl QuoteProvider for YahooQuotes {
    async fn fast_info(&self, symbol: &str) -> anyhow::Result<PriceSnapshot> {
        let chart = self.chart(symbol, "1d").await?;
        let meta = chart
            .pointer("/chart/result/0/meta")
            .ok_or_else(|| anyhow::anyhow!("chart response has no meta for {}", symbol))?;

        Ok(PriceSnapshot {
            last: number(meta, "/regularMarketPrice"),
            prev_close: number(meta, "/previousClose")
                .or_else(|| number(meta, "/chartPreviousClose")),
            exchange: text(meta, "/exchangeName"),
            currency: text(meta, "/currency"),
        })
    }

    async fn info(&self, symbol: &str) -> anyhow::Result<PriceSnapshot> {
        let url = self.endpoint(&["v7", "finance", "quote"])?;
        let body = self.get_json(url, &[("symbols", symbol)]).await?;
        let info = body
            .pointer("/quoteResponse/result/0")
            .ok_or_else(|| anyhow::anyhow!("no quote record for {}", symbol))?;

        Ok(PriceSnapshot {
            last: number(info, "/regularMarketPrice"),
            prev_close: number(info, "/regularMarketPreviousClose"),
            exchange: text(info, "/exchange").or_else(|| text(info, "/fullExchangeName")),
            currency: text(info, "/currency"),
        })
    }

    async fn recent_closes(&self, symbol: &str) -> anyhow::Result<Vec<f64>> {
        let chart = self.chart(symbol, "5d").await?;
        let closes = chart
            .pointer("/chart/result/0/indicators/quote/0/close")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow::anyhow!("chart response has no closes for {}", symbol))?;

        Ok(closes.iter().filter_map(Value::as_f64).collect())
    }
}
