#![allow(dead_code)]

use std::sync::Arc;

use axum::Router;
use sqlx::{Pool, Postgres};
use tokio::sync::RwLock;
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

use diarywatch::{
    app_state::AppState,
    config::FetcherConfig,
    fetcher::{FeedClient, FeedKind},
    health,
    scrape::Scraper,
    watcher::PassStatus,
};

pub const FEED: &str = include_str!("../src/entries/tests/fixtures/feed.xml");
pub const FEED_EMPTY: &str = include_str!("../src/entries/tests/fixtures/feed_empty.xml");
pub const PROFILE: &str = include_str!("../src/entries/tests/fixtures/profile.html");

pub fn test_app(pool: Pool<Postgres>, last_pass: PassStatus) -> Router {
    health::router(AppState::new(pool, last_pass))
}

pub fn empty_status() -> PassStatus {
    Arc::new(RwLock::new(None))
}

pub fn rss_scraper(server: &MockServer) -> Scraper {
    let client =
        FeedClient::new(&FetcherConfig::new(Url::parse(&server.uri()).unwrap())).unwrap();
    Scraper::new(client, FeedKind::Rss)
}

/// Serve `profile`'s RSS feed and profile page from the fixtures.
pub async fn serve_profile(server: &MockServer, profile: &str, feed: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/{profile}/rss/")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(feed)
                .insert_header("Content-Type", "application/rss+xml; charset=utf-8"),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/{profile}/")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(PROFILE)
                .insert_header("Content-Type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}
