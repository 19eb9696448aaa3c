pub mod aggregate;
pub mod app;
pub mod boxoffice;
pub mod cache;
pub mod error;
pub mod models;
pub mod omdb;
pub mod tmdb;
pub mod trakt;
