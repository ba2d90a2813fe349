use std::sync::Arc;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::{
    signal,
    sync::RwLock,
    time::{MissedTickBehavior, interval, sleep},
};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::config::{RenderConfig, WatcherConfig};
use crate::entities::TrackedProfile;
use crate::entries::DiaryEntry;
use crate::render::{Presenter, render};
use crate::repositories::CursorStore;
use crate::scrape::{ScrapeOutcome, Scraper};
use crate::watcher::{notifier::Notifier, posters::PosterLookup};

/// Outcome counts of one pass over every tracked profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub profiles: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Latest pass summary, shared with the health endpoint.
pub type PassStatus = Arc<RwLock<Option<PassSummary>>>;

/// Periodically scrapes every tracked profile and announces new entries.
///
/// Profiles are handled one at a time with fixed pauses between profiles and
/// between messages; the origin rate-limits aggressively.
pub struct DiaryWatcher {
    store: Arc<dyn CursorStore>,
    scraper: Scraper,
    notifier: Arc<dyn Notifier>,
    posters: Option<Arc<dyn PosterLookup>>,
    render: RenderConfig,
    config: WatcherConfig,
    status: PassStatus,
    shutdown_token: CancellationToken,
}

impl DiaryWatcher {
    pub fn new(
        store: Arc<dyn CursorStore>,
        scraper: Scraper,
        notifier: Arc<dyn Notifier>,
        render: RenderConfig,
        config: WatcherConfig,
    ) -> Self {
        Self {
            store,
            scraper,
            notifier,
            posters: None,
            render,
            config,
            status: Arc::new(RwLock::new(None)),
            shutdown_token: CancellationToken::new(),
        }
    }

    pub fn with_posters(mut self, posters: Arc<dyn PosterLookup>) -> Self {
        self.posters = Some(posters);
        self
    }

    pub fn status(&self) -> PassStatus {
        self.status.clone()
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown_token.clone()
    }

    /// Run passes on the configured interval until Ctrl-C. A pass in
    /// progress always finishes before shutdown.
    pub async fn run(self) -> Result<()> {
        info!(
            "Starting diary watcher - poll interval: {}s, profile delay: {}ms, message delay: {}ms",
            self.config.poll_interval.as_secs(),
            self.config.profile_delay.as_millis(),
            self.config.message_delay.as_millis()
        );

        let shutdown_token = self.shutdown_token.clone();
        tokio::spawn(async move {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal, finishing current pass...");
            shutdown_token.cancel();
        });

        let mut ticker = interval(self.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_token.cancelled() => {
                    info!("Watcher shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let pass_id = Uuid::new_v4();
                    self.run_pass()
                        .instrument(info_span!("pass", id = %pass_id))
                        .await;
                }
            }
        }

        Ok(())
    }

    /// One sequential pass over every tracked profile. Failures are counted
    /// per profile and never abort the pass.
    pub async fn run_pass(&self) -> PassSummary {
        let started_at = Utc::now();
        let profiles = match self.store.tracked_profiles().await {
            Ok(profiles) => profiles,
            Err(e) => {
                error!("Failed to load tracked profiles: {}", e);
                Vec::new()
            }
        };
        info!("Checking {} tracked profiles", profiles.len());

        let mut notified = 0;
        let mut failed = 0;
        for (index, profile) in profiles.iter().enumerate() {
            if index > 0 {
                sleep(self.config.profile_delay).await;
            }

            let span = info_span!(
                "profile",
                server_id = profile.server_id,
                profile = %profile.profile_name
            );
            match self.process_profile(profile).instrument(span).await {
                Ok(sent) => notified += sent,
                Err(e) => {
                    failed += 1;
                    warn!(
                        server_id = profile.server_id,
                        profile = %profile.profile_name,
                        "Skipping profile: {:#}", e
                    );
                }
            }
        }

        let summary = PassSummary {
            started_at,
            finished_at: Utc::now(),
            profiles: profiles.len(),
            notified,
            failed,
        };
        info!(
            "Pass finished - profiles: {}, notified: {}, failed: {}",
            summary.profiles, summary.notified, summary.failed
        );
        *self.status.write().await = Some(summary.clone());
        summary
    }

    /// Scrape one profile, advance its cursor and deliver its new entries.
    /// Returns the number of delivered notifications.
    async fn process_profile(&self, profile: &TrackedProfile) -> Result<usize> {
        let outcome = self
            .scraper
            .scrape_delta(&profile.profile_name, profile.last_entry.as_deref())
            .await;

        let (mut entries, newest_title) = match outcome {
            ScrapeOutcome::Invalid(reason) => {
                return Err(anyhow!("profile unavailable ({:?})", reason));
            }
            ScrapeOutcome::NoNewEntries => {
                debug!("No new entries");
                return Ok(0);
            }
            ScrapeOutcome::HasEntries {
                entries,
                newest_title,
            } => (entries, newest_title),
        };

        self.attach_posters(&mut entries).await;

        let presenter = Presenter {
            url: self.scraper.client().profile_url(&profile.profile_name)?,
            name: profile.profile_name.clone(),
            avatar_url: profile
                .avatar_url
                .as_deref()
                .and_then(|url| Url::parse(url).ok()),
        };
        let units = render(&entries, &presenter, &self.render);

        // The cursor moves before delivery so a failing channel cannot cause
        // the same entries to be announced on every pass.
        self.store
            .update_last_entry(profile.server_id, &profile.profile_name, &newest_title)
            .await?;

        let mut delivered = 0;
        for (index, unit) in units.iter().enumerate() {
            if index > 0 {
                sleep(self.config.message_delay).await;
            }
            match self.notifier.deliver(profile.server_id, unit).await {
                Ok(()) => delivered += 1,
                Err(e) => error!("Failed to deliver '{}': {:#}", unit.title, e),
            }
        }

        info!("Announced {}/{} new entries", delivered, units.len());
        Ok(delivered)
    }

    async fn attach_posters(&self, entries: &mut [DiaryEntry]) {
        let Some(posters) = &self.posters else {
            return;
        };
        for entry in entries.iter_mut().filter(|e| e.poster_url.is_none()) {
            entry.poster_url = posters
                .poster(&entry.title, entry.release_year.as_deref())
                .await;
        }
    }
}
