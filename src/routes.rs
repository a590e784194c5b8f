use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::aggregator::{AggregateError, Aggregator};
use crate::layout::HomeLayout;
use crate::quotes::{get_quotes, parse_symbols, Quote, QuoteProvider};

pub struct AppState {
    pub aggregator: Aggregator,
    pub quotes: Arc<dyn QuoteProvider>,
}

impl IntoResponse for AggregateError {
    fn into_response(self) -> Response {
        let status = match &self {
            AggregateError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AggregateError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!("Finance home failed: {}", self);
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/rss/finance-home", get(finance_home))
        .route("/api/quotes", get(quotes))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured browser origins, with credentials allowed.
/// Unparseable origins are skipped.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

// Route handlers
pub async fn finance_home(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HomeLayout>, AggregateError> {
    let layout = state.aggregator.home_layout().await?;
    Ok(Json(layout))
}

#[derive(Deserialize)]
pub struct QuotesQuery {
    pub symbols: String,
}

#[derive(Serialize)]
pub struct QuotesResponse {
    pub quotes: Vec<Quote>,
}

pub async fn quotes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<QuotesQuery>,
) -> Json<QuotesResponse> {
    let symbols = parse_symbols(&query.symbols);
    let quotes = get_quotes(state.quotes.as_ref(), &symbols).await;
    Json(QuotesResponse { quotes })
}

pub async fn health() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}
