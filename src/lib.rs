//! Finance Home - RSS aggregation backend
//!
//! This crate fetches several RSS/Atom feeds concurrently, ranks their entries
//! by recency and slices them into the sections of a news home page. It also
//! serves stock quotes through a multi-tier fallback chain.

pub mod aggregator;
pub mod config;
pub mod entry;
pub mod fetcher;
pub mod layout;
pub mod normalizer;
pub mod quotes;
pub mod ranker;
pub mod routes;
