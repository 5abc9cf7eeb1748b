use serde::{Deserialize, Serialize};

use super::tmdb::{CountryProviders, TmdbMovie};

/// Normalized movie returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSummary {
    pub title: Option<String>,
    /// Four-digit release year, or empty
    pub year: String,
    pub poster: Option<String>,
    pub providers: Vec<String>,
    /// Deep link into the provider country page
    pub link: Option<String>,
}

/// Watch-provider data merged into a summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchOptions {
    pub providers: Vec<String>,
    pub link: Option<String>,
}

impl From<&CountryProviders> for WatchOptions {
    fn from(country: &CountryProviders) -> Self {
        Self {
            providers: country.flatrate_names(),
            link: country.link.clone(),
        }
    }
}

impl MovieSummary {
    pub fn from_listing(movie: TmdbMovie, image_base_url: &str, watch: WatchOptions) -> Self {
        Self {
            year: release_year(movie.release_date.as_deref()),
            poster: poster_url(image_base_url, movie.poster_path.as_deref()),
            title: movie.title,
            providers: watch.providers,
            link: watch.link,
        }
    }
}

/// First four characters of a release date, or empty if there aren't four
pub fn release_year(release_date: Option<&str>) -> String {
    let year: String = release_date.unwrap_or_default().chars().take(4).collect();
    if year.chars().count() == 4 {
        year
    } else {
        String::new()
    }
}

pub fn poster_url(image_base_url: &str, poster_path: Option<&str>) -> Option<String> {
    poster_path
        .filter(|path| !path.is_empty())
        .map(|path| format!("{}{}", image_base_url, path))
}
