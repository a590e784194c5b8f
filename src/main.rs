use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use finance_home::aggregator::Aggregator;
use finance_home::config::Config;
use finance_home::fetcher::{build_client, Fetcher};
use finance_home::quotes::YahooQuotes;
use finance_home::routes::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "finance_home=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("FEEDS_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded {} feeds from {}", config.feeds.len(), config_path);

    let client = build_client(config.request_timeout(), &config.user_agent)?;

    let state = Arc::new(AppState {
        aggregator: Aggregator::new(Fetcher::new(client.clone()), config.feeds.clone()),
        quotes: Arc::new(YahooQuotes::new(client, config.quotes_base_url.clone())),
    });

    let app = routes::router(state).layer(routes::cors_layer(&config.cors_origins));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.listen).await?;
    info!("Server starting on http://{}", config.listen);

    axum::serve(listener, app).await?;

    Ok(())
}
