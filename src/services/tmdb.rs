/// TMDb v3 API client
///
/// API Flow:
/// 1. List: /search/movie?query=... or /trending/movie/week → ranked result list
/// 2. Providers: /movie/{id}/watch/providers → offerings keyed by country code
///
/// Every call carries the `api_key` query parameter and is bounded by the
/// configured timeout. Calls are never retried.
use std::time::Duration;

use reqwest::{Client as HttpClient, StatusCode};
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppResult, UpstreamError},
    models::{MoviePage, WatchProviders},
};

const SEARCH_PATH: &str = "/search/movie";
const TRENDING_PATH: &str = "/trending/movie/week";

/// Upstream movie metadata operations used by the aggregator
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait TmdbApi: Send + Sync {
    /// Search movies by title, in upstream relevance order
    async fn search_movies(&self, query: &str) -> Result<MoviePage, UpstreamError>;

    /// Movies trending this week
    async fn trending_movies(&self) -> Result<MoviePage, UpstreamError>;

    /// Watch-provider offerings for one movie, keyed by country code
    async fn watch_providers(&self, movie_id: u64) -> Result<WatchProviders, UpstreamError>;
}

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl std::fmt::Debug for TmdbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TmdbClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl TmdbClient {
    pub fn new(api_key: String, api_url: String, timeout: Duration) -> AppResult<Self> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.tmdb_api_key.clone(),
            config.tmdb_api_url.clone(),
            config.tmdb_timeout(),
        )
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// GET a TMDb resource with the credential attached and return the parsed body
    ///
    /// The body is parsed before the status is checked, so an error status
    /// with a JSON body surfaces upstream's `status_message`.
    pub async fn get(&self, path: &str, params: &[(&str, &str)]) -> Result<Value, UpstreamError> {
        let url = self.endpoint(path);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| network_error(&url, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| network_error(&url, e))?;

        let data: Value = serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                url = %url,
                status = status.as_u16(),
                error = %e,
                response = %text,
                "Non-JSON response from TMDb"
            );
            UpstreamError::Decode {
                status_code: status.as_u16(),
                text: text.clone(),
            }
        })?;

        if status != StatusCode::OK {
            let message = data
                .get("status_message")
                .and_then(Value::as_str)
                .unwrap_or("TMDb error")
                .to_string();

            tracing::error!(
                url = %url,
                status = status.as_u16(),
                response = %data,
                "TMDb returned error"
            );

            return Err(UpstreamError::Status {
                message,
                status_code: status.as_u16(),
            });
        }

        Ok(data)
    }
}

// The request URL carries the api key, so it is stripped from the error text.
fn network_error(url: &str, error: reqwest::Error) -> UpstreamError {
    let error = error.without_url();
    tracing::error!(url = %url, error = %error, "Network error calling TMDb");
    UpstreamError::Network {
        detail: error.to_string(),
    }
}

#[async_trait::async_trait]
impl TmdbApi for TmdbClient {
    async fn search_movies(&self, query: &str) -> Result<MoviePage, UpstreamError> {
        let data = self.get(SEARCH_PATH, &[("query", query)]).await?;
        Ok(MoviePage::from_value(data))
    }

    async fn trending_movies(&self) -> Result<MoviePage, UpstreamError> {
        let data = self.get(TRENDING_PATH, &[]).await?;
        Ok(MoviePage::from_value(data))
    }

    async fn watch_providers(&self, movie_id: u64) -> Result<WatchProviders, UpstreamError> {
        let path = format!("/movie/{}/watch/providers", movie_id);
        let data = self.get(&path, &[]).await?;
        Ok(WatchProviders::from_value(data))
    }
}
