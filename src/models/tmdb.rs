//! Upstream TMDb response shapes.
//!
//! Every field is optional and decoded leniently: a missing, null or
//! mistyped field reads as absent instead of failing the whole payload.

use std::collections::HashMap;

use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use serde_json::Value;

/// One entry of a `/search/movie` or `/trending/movie/week` result list
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct TmdbMovie {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub poster_path: Option<String>,
}

/// Paged result list returned by the search and trending resources
///
/// Non-object entries still occupy a slot (as an all-absent movie) so the
/// list stays 1:1 with what upstream returned.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct MoviePage {
    #[serde(default, deserialize_with = "lenient_seq")]
    pub results: Vec<TmdbMovie>,
}

/// Response of `/movie/{id}/watch/providers`, keyed by country code
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct WatchProviders {
    #[serde(default, deserialize_with = "lenient_map")]
    pub results: HashMap<String, CountryProviders>,
}

/// Offerings for a single country
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct CountryProviders {
    #[serde(default, deserialize_with = "lenient")]
    pub link: Option<String>,
    /// Subscription offerings, in upstream order
    #[serde(default, deserialize_with = "lenient_seq")]
    pub flatrate: Vec<ProviderEntry>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct ProviderEntry {
    #[serde(default, deserialize_with = "lenient")]
    pub provider_name: Option<String>,
}

impl MoviePage {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

impl WatchProviders {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn for_country(&self, country: &str) -> Option<&CountryProviders> {
        self.results.get(country)
    }
}

impl CountryProviders {
    /// Names of the flatrate providers, skipping entries without a name
    pub fn flatrate_names(&self) -> Vec<String> {
        self.flatrate
            .iter()
            .filter_map(|entry| entry.provider_name.clone())
            .collect()
    }
}

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

fn lenient_seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items
            .into_iter()
            .map(|item| serde_json::from_value(item).unwrap_or_default())
            .collect()),
        _ => Ok(Vec::new()),
    }
}

fn lenient_map<'de, D, T>(deserializer: D) -> Result<HashMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    match Value::deserialize(deserializer)? {
        Value::Object(entries) => Ok(entries
            .into_iter()
            .filter_map(|(key, value)| {
                if !value.is_object() {
                    return None;
                }
                serde_json::from_value(value).ok().map(|parsed| (key, parsed))
            })
            .collect()),
        _ => Ok(HashMap::new()),
    }
}
