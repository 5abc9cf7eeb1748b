pub mod aggregator;
pub mod tmdb;

pub use aggregator::Aggregator;
pub use tmdb::{TmdbApi, TmdbClient};
