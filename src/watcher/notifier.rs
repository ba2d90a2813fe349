use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, info};
use url::Url;

use crate::render::DisplayUnit;
use crate::repositories::ChannelDirectory;

/// Delivers rendered units to a server's channel.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, server_id: i64, unit: &DisplayUnit) -> Result<()>;
}

/// Writes notifications to the log.
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, server_id: i64, unit: &DisplayUnit) -> Result<()> {
        info!(
            server_id,
            title = %unit.title,
            rating = %unit.description,
            url = unit.url.as_deref().unwrap_or_default(),
            "diary notification"
        );
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookMessage<'a> {
    embeds: [&'a DisplayUnit; 1],
}

/// Posts each unit as a single-embed message to the server's chat webhook.
///
/// The destination is the server's configured channel, else the default
/// webhook. Servers with neither only get a log line.
#[derive(Clone)]
pub struct WebhookNotifier {
    http: Client,
    channels: Option<Arc<dyn ChannelDirectory>>,
    default_url: Option<Url>,
}

impl WebhookNotifier {
    pub fn new(http: Client, default_url: Option<Url>) -> Self {
        Self {
            http,
            channels: None,
            default_url,
        }
    }

    pub fn with_channels(mut self, channels: Arc<dyn ChannelDirectory>) -> Self {
        self.channels = Some(channels);
        self
    }

    async fn destination(&self, server_id: i64) -> Result<Option<Url>> {
        if let Some(channels) = &self.channels
            && let Some(url) = channels
                .webhook_for(server_id)
                .await
                .context("channel lookup failed")?
        {
            return Ok(Some(url));
        }
        Ok(self.default_url.clone())
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn deliver(&self, server_id: i64, unit: &DisplayUnit) -> Result<()> {
        let Some(url) = self.destination(server_id).await? else {
            debug!(server_id, "no channel configured");
            return LogNotifier.deliver(server_id, unit).await;
        };

        self.http
            .post(url)
            .json(&WebhookMessage { embeds: [unit] })
            .send()
            .await
            .context("webhook request failed")?
            .error_for_status()
            .with_context(|| format!("webhook rejected notification for server {server_id}"))?;

        Ok(())
    }
}
