use sqlx::{Pool, Postgres};

use crate::watcher::PassStatus;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Pool<Postgres>,
    pub last_pass: PassStatus,
}

impl AppState {
    pub fn new(pool: Pool<Postgres>, last_pass: PassStatus) -> Self {
        Self {
            db_pool: pool,
            last_pass,
        }
    }
}
