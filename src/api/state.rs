use std::{path::PathBuf, sync::Arc};

use crate::{
    config::Config,
    error::AppResult,
    services::{Aggregator, TmdbClient},
};

/// Shared application state
///
/// Holds no mutable data: every request works on its own local results.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Aggregator,
    /// Root of the frontend bundle
    pub static_dir: PathBuf,
    /// Document served for `GET /`, relative to `static_dir`
    pub index_file: String,
}

impl AppState {
    pub fn new(aggregator: Aggregator, static_dir: PathBuf, index_file: String) -> Self {
        Self {
            aggregator,
            static_dir,
            index_file,
        }
    }

    /// Builds the TMDb client and aggregator from configuration
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let client = TmdbClient::from_config(config)?;
        let aggregator = Aggregator::new(Arc::new(client), config.tmdb_image_base_url.clone());

        Ok(Self::new(
            aggregator,
            config.static_dir.clone(),
            config.index_file.clone(),
        ))
    }

    pub fn index_path(&self) -> PathBuf {
        self.static_dir.join(&self.index_file)
    }
}
