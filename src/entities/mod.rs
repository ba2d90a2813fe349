use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A profile tracked for one chat server (`diary_users` row).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct TrackedProfile {
    pub server_id: i64,
    pub profile_name: String,
    pub avatar_url: Option<String>,
    /// Title of the newest entry already announced; `None` until the profile
    /// logs its first entry.
    pub last_entry: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The webhook a chat server announces to (`server_channels` row).
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ServerChannel {
    pub server_id: i64,
    pub webhook_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
