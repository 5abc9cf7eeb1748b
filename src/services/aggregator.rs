use std::sync::Arc;

use tracing::{instrument, Instrument};

use crate::{
    error::{AppError, AppResult, UpstreamError},
    models::{MoviePage, MovieSummary, TmdbMovie, WatchOptions},
    services::tmdb::TmdbApi,
};

/// Number of search results enriched with provider data
pub const SEARCH_LIMIT: usize = 5;
/// Number of trending results enriched with provider data
pub const TRENDING_LIMIT: usize = 10;
pub const DEFAULT_COUNTRY: &str = "US";

/// Fetches a ranked movie list and merges per-movie watch providers into it
///
/// Only the list call can fail the request. Provider lookups run as one task
/// per movie and a failed lookup degrades that movie to no providers.
#[derive(Clone)]
pub struct Aggregator {
    api: Arc<dyn TmdbApi>,
    image_base_url: String,
}

impl Aggregator {
    pub fn new(api: Arc<dyn TmdbApi>, image_base_url: impl Into<String>) -> Self {
        Self {
            api,
            image_base_url: image_base_url.into(),
        }
    }

    /// Search movies by title and summarize the top results for `country`
    #[instrument(skip_all)]
    pub async fn search(&self, query: &str, country: &str) -> AppResult<Vec<MovieSummary>> {
        if query.is_empty() {
            return Err(AppError::MissingParameter(
                "No movie name provided".to_string(),
            ));
        }

        let page = self
            .api
            .search_movies(query)
            .await
            .map_err(|source| aggregation_failure("TMDb search failed", source))?;

        let summaries = self.summarize(page, SEARCH_LIMIT, country).await;

        tracing::info!(results = summaries.len(), "Search completed");

        Ok(summaries)
    }

    /// Summarize this week's trending movies for `country`
    #[instrument(skip_all)]
    pub async fn trending(&self, country: &str) -> AppResult<Vec<MovieSummary>> {
        let page = self
            .api
            .trending_movies()
            .await
            .map_err(|source| aggregation_failure("TMDb trending failed", source))?;

        let summaries = self.summarize(page, TRENDING_LIMIT, country).await;

        tracing::info!(results = summaries.len(), "Trending completed");

        Ok(summaries)
    }

    async fn summarize(&self, page: MoviePage, limit: usize, country: &str) -> Vec<MovieSummary> {
        let movies: Vec<TmdbMovie> = page.results.into_iter().take(limit).collect();

        let mut tasks = Vec::with_capacity(movies.len());
        for movie in &movies {
            let api = Arc::clone(&self.api);
            let movie_id = movie.id;
            let country = country.to_string();
            tasks.push(tokio::spawn(
                async move { lookup_watch_options(api.as_ref(), movie_id, &country).await }
                    .in_current_span(),
            ));
        }

        // Joined in list order so the output keeps upstream ranking
        let mut summaries = Vec::with_capacity(movies.len());
        for (movie, task) in movies.into_iter().zip(tasks) {
            let watch = match task.await {
                Ok(watch) => watch,
                Err(e) => {
                    tracing::warn!(movie_id = ?movie.id, error = %e, "Provider lookup task failed");
                    WatchOptions::default()
                }
            };
            summaries.push(MovieSummary::from_listing(movie, &self.image_base_url, watch));
        }

        summaries
    }
}

fn aggregation_failure(context: &'static str, source: UpstreamError) -> AppError {
    tracing::error!(error = %source, "{}", context);
    AppError::Aggregation { context, source }
}

async fn lookup_watch_options(
    api: &dyn TmdbApi,
    movie_id: Option<u64>,
    country: &str,
) -> WatchOptions {
    let Some(movie_id) = movie_id else {
        tracing::debug!("Skipping provider lookup for result without an id");
        return WatchOptions::default();
    };

    match api.watch_providers(movie_id).await {
        Ok(providers) => providers
            .for_country(country)
            .map(WatchOptions::from)
            .unwrap_or_default(),
        Err(e) => {
            tracing::warn!(movie_id, error = %e, "Provider lookup failed");
            WatchOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{CountryProviders, ProviderEntry, WatchProviders},
        services::tmdb::MockTmdbApi,
    };
    use std::collections::HashMap;

    const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w200";

    fn movie(id: u64, title: &str) -> TmdbMovie {
        TmdbMovie {
            id: Some(id),
            title: Some(title.to_string()),
            release_date: Some("2020-05-01".to_string()),
            poster_path: Some(format!("/{}.jpg", id)),
        }
    }

    fn page(count: u64) -> MoviePage {
        MoviePage {
            results: (1..=count).map(|id| movie(id, &format!("Movie {}", id))).collect(),
        }
    }

    fn providers_in(country: &str, names: &[&str], link: &str) -> WatchProviders {
        let mut results = HashMap::new();
        results.insert(
            country.to_string(),
            CountryProviders {
                link: Some(link.to_string()),
                flatrate: names
                    .iter()
                    .map(|name| ProviderEntry {
                        provider_name: Some(name.to_string()),
                    })
                    .collect(),
            },
        );
        WatchProviders { results }
    }

    fn aggregator(mock: MockTmdbApi) -> Aggregator {
        Aggregator::new(Arc::new(mock), IMAGE_BASE)
    }

    #[tokio::test]
    async fn test_search_single_result() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies()
            .withf(|query| query == "X")
            .times(1)
            .returning(|_| {
                Ok(MoviePage {
                    results: vec![TmdbMovie {
                        id: Some(1),
                        title: Some("X".to_string()),
                        release_date: Some("2020-05-01".to_string()),
                        poster_path: Some("/p.jpg".to_string()),
                    }],
                })
            });
        mock.expect_watch_providers()
            .withf(|id| *id == 1)
            .times(1)
            .returning(|_| Ok(providers_in("US", &["Netflix"], "http://x")));

        let summaries = aggregator(mock).search("X", "US").await.unwrap();

        assert_eq!(
            summaries,
            vec![MovieSummary {
                title: Some("X".to_string()),
                year: "2020".to_string(),
                poster: Some("https://image.tmdb.org/t/p/w200/p.jpg".to_string()),
                providers: vec!["Netflix".to_string()],
                link: Some("http://x".to_string()),
            }]
        );
    }

    #[tokio::test]
    async fn test_search_truncates_to_five_in_order() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().returning(|_| Ok(page(8)));
        mock.expect_watch_providers()
            .times(SEARCH_LIMIT)
            .returning(|_| Ok(WatchProviders::default()));

        let summaries = aggregator(mock).search("Movie", "US").await.unwrap();

        let titles: Vec<_> = summaries.iter().filter_map(|s| s.title.clone()).collect();
        assert_eq!(
            titles,
            vec!["Movie 1", "Movie 2", "Movie 3", "Movie 4", "Movie 5"]
        );
    }

    #[tokio::test]
    async fn test_empty_query_makes_no_upstream_calls() {
        // No expectations: any call on the mock panics
        let mock = MockTmdbApi::new();

        let result = aggregator(mock).search("", "US").await;

        assert!(matches!(result, Err(AppError::MissingParameter(_))));
    }

    #[tokio::test]
    async fn test_list_failure_aborts_without_provider_lookups() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().times(1).returning(|_| {
            Err(UpstreamError::Network {
                detail: "operation timed out".to_string(),
            })
        });
        mock.expect_watch_providers().times(0);

        let result = aggregator(mock).search("X", "US").await;

        match result {
            Err(AppError::Aggregation { context, source }) => {
                assert_eq!(context, "TMDb search failed");
                assert!(matches!(source, UpstreamError::Network { .. }));
            }
            other => panic!("expected aggregation failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_provider_failure_degrades_single_item() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().returning(|_| Ok(page(3)));
        mock.expect_watch_providers().returning(|id| {
            if id == 2 {
                Err(UpstreamError::Status {
                    message: "The resource you requested could not be found.".to_string(),
                    status_code: 404,
                })
            } else {
                Ok(providers_in("US", &["Netflix", "Hulu"], "http://x"))
            }
        });

        let summaries = aggregator(mock).search("Movie", "US").await.unwrap();

        assert_eq!(summaries.len(), 3);
        assert_eq!(summaries[0].providers, vec!["Netflix", "Hulu"]);
        assert!(summaries[1].providers.is_empty());
        assert_eq!(summaries[1].link, None);
        assert_eq!(summaries[1].title.as_deref(), Some("Movie 2"));
        assert_eq!(summaries[2].link.as_deref(), Some("http://x"));
    }

    #[tokio::test]
    async fn test_missing_country_yields_no_providers() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().returning(|_| Ok(page(1)));
        mock.expect_watch_providers()
            .returning(|_| Ok(providers_in("US", &["Netflix"], "http://x")));

        let summaries = aggregator(mock).search("Movie", "GB").await.unwrap();

        assert!(summaries[0].providers.is_empty());
        assert_eq!(summaries[0].link, None);
    }

    #[tokio::test]
    async fn test_result_without_id_skips_provider_lookup() {
        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().returning(|_| {
            Ok(MoviePage {
                results: vec![TmdbMovie {
                    title: Some("Orphan".to_string()),
                    ..TmdbMovie::default()
                }],
            })
        });
        mock.expect_watch_providers().times(0);

        let summaries = aggregator(mock).search("Orphan", "US").await.unwrap();

        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].title.as_deref(), Some("Orphan"));
        assert_eq!(summaries[0].poster, None);
        assert!(summaries[0].providers.is_empty());
    }

    #[tokio::test]
    async fn test_provider_lookups_run_inside_request_span() {
        let _guard = tracing::subscriber::set_default(tracing_subscriber::registry());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));

        let mut mock = MockTmdbApi::new();
        mock.expect_search_movies().returning(|_| Ok(page(3)));
        let recorder = Arc::clone(&seen);
        mock.expect_watch_providers().returning(move |_| {
            let span = tracing::Span::current();
            recorder
                .lock()
                .unwrap()
                .push(span.metadata().map(|meta| (meta.name(), meta.fields().len())));
            Ok(WatchProviders::default())
        });

        aggregator(mock).search("Movie", "US").await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        // query/country are logged once by the handler, not repeated on the span
        assert!(seen.iter().all(|span| *span == Some(("search", 0))));
    }

    #[tokio::test]
    async fn test_trending_truncates_to_ten() {
        let mut mock = MockTmdbApi::new();
        mock.expect_trending_movies().times(1).returning(|| Ok(page(20)));
        mock.expect_watch_providers()
            .times(TRENDING_LIMIT)
            .returning(|_| Ok(providers_in("DE", &["Netflix"], "http://de")));

        let summaries = aggregator(mock).trending("DE").await.unwrap();

        assert_eq!(summaries.len(), TRENDING_LIMIT);
        assert_eq!(summaries[9].title.as_deref(), Some("Movie 10"));
        assert!(summaries.iter().all(|s| s.providers == vec!["Netflix"]));
    }

    #[tokio::test]
    async fn test_trending_failure_context() {
        let mut mock = MockTmdbApi::new();
        mock.expect_trending_movies().returning(|| {
            Err(UpstreamError::Decode {
                status_code: 200,
                text: "not json".to_string(),
            })
        });

        let result = aggregator(mock).trending("US").await;

        assert!(matches!(
            result,
            Err(AppError::Aggregation {
                context: "TMDb trending failed",
                ..
            })
        ));
    }
}
