pub mod app_state;
pub mod config;
pub mod entities;
pub mod entries;
pub mod fetcher;
pub mod health;
pub mod render;
pub mod repositories;
pub mod scrape;
pub mod watcher;
