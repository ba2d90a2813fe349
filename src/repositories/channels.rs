use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use url::Url;

use crate::entities::ServerChannel;

/// Per-server delivery destinations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChannelDirectory: Send + Sync {
    async fn webhook_for(&self, server_id: i64) -> Result<Option<Url>>;
}

/// Repository over the `server_channels` table.
#[derive(Clone)]
pub struct ServerChannelRepository {
    pool: PgPool,
}

impl ServerChannelRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Point a server's announcements at `webhook_url`, replacing any previous one.
    pub async fn set(&self, server_id: i64, webhook_url: &Url) -> Result<ServerChannel> {
        let channel = sqlx::query_as::<_, ServerChannel>(
            r#"
            INSERT INTO server_channels (server_id, webhook_url)
            VALUES ($1, $2)
            ON CONFLICT (server_id)
            DO UPDATE SET webhook_url = EXCLUDED.webhook_url, updated_at = now()
            RETURNING server_id, webhook_url, created_at, updated_at
            "#,
        )
        .bind(server_id)
        .bind(webhook_url.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(channel)
    }

    pub async fn find(&self, server_id: i64) -> Result<Option<ServerChannel>> {
        let channel = sqlx::query_as::<_, ServerChannel>(
            "SELECT server_id, webhook_url, created_at, updated_at FROM server_channels WHERE server_id = $1",
        )
        .bind(server_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(channel)
    }

    /// Returns whether a channel was configured.
    pub async fn remove(&self, server_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM server_channels WHERE server_id = $1")
            .bind(server_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ChannelDirectory for ServerChannelRepository {
    async fn webhook_for(&self, server_id: i64) -> Result<Option<Url>> {
        let Some(channel) = self.find(server_id).await? else {
            return Ok(None);
        };
        let url = Url::parse(&channel.webhook_url)
            .with_context(|| format!("stored webhook for server {server_id} is not a URL"))?;
        Ok(Some(url))
    }
}
