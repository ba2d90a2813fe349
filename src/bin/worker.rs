use std::sync::Arc;

use anyhow::Result;
use diarywatch::{
    app_state::AppState,
    config::Config,
    fetcher::FeedClient,
    health,
    repositories::{ServerChannelRepository, TrackedProfileRepository},
    scrape::Scraper,
    watcher::{DiaryWatcher, Notifier, OMDB_ENDPOINT, OmdbPosters, WebhookNotifier},
};
use tracing::{error, info};
use url::Url;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(config.database_url())
        .await?;

    let client = FeedClient::new(config.fetcher())?;
    let scraper = Scraper::new(client.clone(), config.feed_kind());

    if config.webhook_url().is_none() {
        info!("No default webhook configured, servers without a channel are only logged");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(
        WebhookNotifier::new(client.http().clone(), config.webhook_url().cloned())
            .with_channels(Arc::new(ServerChannelRepository::new(pool.clone()))),
    );

    let mut watcher = DiaryWatcher::new(
        Arc::new(TrackedProfileRepository::new(pool.clone())),
        scraper,
        notifier,
        config.render().clone(),
        config.watcher().clone(),
    );
    if let Some(api_key) = config.omdb_api_key() {
        let endpoint = Url::parse(OMDB_ENDPOINT)?;
        watcher = watcher.with_posters(Arc::new(OmdbPosters::new(
            client.http().clone(),
            endpoint,
            api_key,
        )));
    }

    let app = health::router(AppState::new(pool, watcher.status()));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Health endpoint listening on {}", config.bind_addr());

    let shutdown = watcher.shutdown_token();
    let server = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await;
        if let Err(e) = result {
            error!("Health server failed: {}", e);
        }
    });

    watcher.run().await?;
    server.await?;
    Ok(())
}
