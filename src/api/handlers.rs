use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::{json, Value};

use crate::{
    error::AppResult,
    middleware::RequestId,
    models::MovieSummary,
    services::aggregator::DEFAULT_COUNTRY,
};

use super::AppState;

/// Raw query pairs; repeated keys are allowed and the first occurrence wins
type QueryPairs = Vec<(String, String)>;

fn first_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Search movies by title and attach watch providers for the requested country
pub async fn search(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<QueryPairs>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let query = first_param(&params, "q").unwrap_or_default();
    let country = first_param(&params, "country").unwrap_or(DEFAULT_COUNTRY);

    tracing::info!(
        request_id = %request_id,
        query = %query,
        country = %country,
        "Processing search request"
    );

    let movies = state.aggregator.search(query, country).await?;
    Ok(Json(movies))
}

/// Trending movies this week with watch providers for the requested country
pub async fn trending(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<QueryPairs>,
) -> AppResult<Json<Vec<MovieSummary>>> {
    let country = first_param(&params, "country").unwrap_or(DEFAULT_COUNTRY);

    tracing::info!(
        request_id = %request_id,
        country = %country,
        "Processing trending request"
    );

    let movies = state.aggregator.trending(country).await?;
    Ok(Json(movies))
}
