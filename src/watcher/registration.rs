use anyhow::Result;
use sqlx::PgPool;
use tracing::{info, instrument, warn};
use url::Url;

use crate::entries::DiaryEntry;
use crate::fetcher::client::is_valid_profile_slug;
use crate::repositories::TrackedProfileRepository;
use crate::scrape::{FirstScrapeOutcome, InvalidReason, Scraper};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// Tracked, with the newest entry stored as the cursor.
    Registered {
        entry: DiaryEntry,
        avatar_url: Option<Url>,
    },
    /// Tracked, but the profile has not logged anything yet.
    RegisteredWithoutEntries,
    AlreadyTracked,
    ServerFull,
    InvalidProfile(InvalidReason),
}

/// Start tracking `profile` for a server.
///
/// The profile is scraped before any write so no connection is held across
/// the network calls. Capacity and duplicate checks are then repeated under a
/// per-server advisory lock, and the row is inserted and seeded in the same
/// transaction. The newest entry becomes the cursor, so it is returned to the
/// caller but never announced by the watcher.
#[instrument(skip(pool, scraper))]
pub async fn register_profile(
    pool: &PgPool,
    scraper: &Scraper,
    server_id: i64,
    profile: &str,
    max_profiles: i64,
) -> Result<RegistrationOutcome> {
    let profile = profile.trim().to_lowercase();
    if !is_valid_profile_slug(&profile) {
        return Ok(RegistrationOutcome::InvalidProfile(InvalidReason::NotFound));
    }

    // Cheap early answers; authoritative checks happen under the lock.
    let repo = TrackedProfileRepository::new(pool.clone());
    if repo.find(server_id, &profile).await?.is_some() {
        return Ok(RegistrationOutcome::AlreadyTracked);
    }
    let tracked = {
        let mut conn = pool.acquire().await?;
        TrackedProfileRepository::count_for_server(&mut *conn, server_id).await?
    };
    if tracked >= max_profiles {
        return Ok(RegistrationOutcome::ServerFull);
    }

    let (newest, avatar_url) = match scraper.scrape_first(&profile).await {
        FirstScrapeOutcome::Invalid(reason) => {
            warn!(?reason, "rejecting profile");
            return Ok(RegistrationOutcome::InvalidProfile(reason));
        }
        FirstScrapeOutcome::NoEntriesYet => (None, scraper.profile_avatar_url(&profile).await),
        FirstScrapeOutcome::HasEntry { entry, avatar_url } => (Some(entry), avatar_url),
    };

    let mut tx = pool.begin().await?;
    TrackedProfileRepository::lock_server(&mut *tx, server_id).await?;

    if TrackedProfileRepository::count_for_server(&mut *tx, server_id).await? >= max_profiles {
        tx.rollback().await?;
        return Ok(RegistrationOutcome::ServerFull);
    }

    if !TrackedProfileRepository::insert(&mut *tx, server_id, &profile).await? {
        tx.rollback().await?;
        return Ok(RegistrationOutcome::AlreadyTracked);
    }

    TrackedProfileRepository::seed(
        &mut *tx,
        server_id,
        &profile,
        newest.as_ref().map(|entry| entry.title.as_str()),
        avatar_url.as_ref().map(Url::as_str),
    )
    .await?;
    tx.commit().await?;
    info!("profile registered");

    Ok(match newest {
        Some(entry) => RegistrationOutcome::Registered { entry, avatar_url },
        None => RegistrationOutcome::RegisteredWithoutEntries,
    })
}

/// Stop tracking `profile`. Returns whether it was tracked.
pub async fn unregister_profile(pool: &PgPool, server_id: i64, profile: &str) -> Result<bool> {
    let profile = profile.trim().to_lowercase();
    TrackedProfileRepository::new(pool.clone())
        .remove(server_id, &profile)
        .await
}
