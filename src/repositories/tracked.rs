use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};

use crate::entities::TrackedProfile;

const PROFILE_COLUMNS: &str =
    "server_id, profile_name, avatar_url, last_entry, created_at, updated_at";

/// The cursor contract the watcher needs from persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CursorStore: Send + Sync {
    /// Every tracked profile, in a stable order.
    async fn tracked_profiles(&self) -> Result<Vec<TrackedProfile>>;

    /// Record the newest announced entry for a profile.
    async fn update_last_entry(&self, server_id: i64, profile_name: &str, title: &str)
    -> Result<()>;
}

/// Repository over the `diary_users` table.
#[derive(Clone)]
pub struct TrackedProfileRepository {
    pool: PgPool,
}

impl TrackedProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn list_all(&self) -> Result<Vec<TrackedProfile>> {
        let profiles = sqlx::query_as::<_, TrackedProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM diary_users ORDER BY server_id, created_at, profile_name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    pub async fn list_for_server(&self, server_id: i64) -> Result<Vec<TrackedProfile>> {
        let profiles = sqlx::query_as::<_, TrackedProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM diary_users WHERE server_id = $1 ORDER BY profile_name"
        ))
        .bind(server_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(profiles)
    }

    pub async fn find(&self, server_id: i64, profile_name: &str) -> Result<Option<TrackedProfile>> {
        let profile = sqlx::query_as::<_, TrackedProfile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM diary_users WHERE server_id = $1 AND profile_name = $2"
        ))
        .bind(server_id)
        .bind(profile_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    /// Stop tracking a profile. Returns whether a row was removed.
    pub async fn remove(&self, server_id: i64, profile_name: &str) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM diary_users WHERE server_id = $1 AND profile_name = $2")
                .bind(server_id)
                .bind(profile_name)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Serialize registrations for one server until the transaction ends.
    pub async fn lock_server(conn: &mut PgConnection, server_id: i64) -> Result<()> {
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(server_id)
            .execute(conn)
            .await?;

        Ok(())
    }

    /// Number of profiles a server tracks.
    pub async fn count_for_server(conn: &mut PgConnection, server_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM diary_users WHERE server_id = $1")
            .bind(server_id)
            .fetch_one(conn)
            .await?;

        Ok(count)
    }

    /// Insert a profile without a cursor. Returns `false` if it already exists.
    pub async fn insert(conn: &mut PgConnection, server_id: i64, profile_name: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO diary_users (server_id, profile_name)
            VALUES ($1, $2)
            ON CONFLICT (server_id, profile_name) DO NOTHING
            "#,
        )
        .bind(server_id)
        .bind(profile_name)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Store the cursor and avatar found when a profile is first scraped.
    pub async fn seed(
        conn: &mut PgConnection,
        server_id: i64,
        profile_name: &str,
        last_entry: Option<&str>,
        avatar_url: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE diary_users
            SET last_entry = $3,
                avatar_url = $4,
                updated_at = now()
            WHERE server_id = $1 AND profile_name = $2
            "#,
        )
        .bind(server_id)
        .bind(profile_name)
        .bind(last_entry)
        .bind(avatar_url)
        .execute(conn)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl CursorStore for TrackedProfileRepository {
    async fn tracked_profiles(&self) -> Result<Vec<TrackedProfile>> {
        self.list_all().await
    }

    async fn update_last_entry(
        &self,
        server_id: i64,
        profile_name: &str,
        title: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE diary_users
            SET last_entry = $3, updated_at = now()
            WHERE server_id = $1 AND profile_name = $2
            "#,
        )
        .bind(server_id)
        .bind(profile_name)
        .bind(title)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
