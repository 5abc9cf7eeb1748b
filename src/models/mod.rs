pub mod movie;
pub mod tmdb;

pub use movie::{MovieSummary, WatchOptions};
pub use tmdb::{CountryProviders, MoviePage, ProviderEntry, TmdbMovie, WatchProviders};
