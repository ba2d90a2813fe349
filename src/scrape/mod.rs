//! New-entry detection for a single profile.
//!
//! A profile's cursor is the title of the newest entry already announced.
//! Scraping walks the feed newest-first and collects entries until it meets
//! the cursor, inspecting at most [`LOOKAHEAD_WINDOW`] entries. Titles are the
//! only identity the origin offers, so the same film logged twice in a row is
//! indistinguishable from "nothing new".

use tracing::{debug, error, info, instrument, warn};
use url::Url;

use crate::entries::{
    DiaryEntry, FeedDocument, ParsedEntries, RawEntry, TitleCheck, avatar::avatar_url,
};
use crate::fetcher::{FeedClient, FeedKind, FetchResult};

/// Entries inspected per scrape. A larger backlog is not recovered.
pub const LOOKAHEAD_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    /// The profile does not exist (or the feed could not be read as one).
    NotFound,
    /// The origin could not be reached.
    Unreachable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrapeOutcome {
    Invalid(InvalidReason),
    NoNewEntries,
    /// Newest first. `newest_title` becomes the next cursor.
    HasEntries {
        entries: Vec<DiaryEntry>,
        newest_title: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstScrapeOutcome {
    Invalid(InvalidReason),
    /// The profile exists but has no diary entries at all.
    NoEntriesYet,
    HasEntry {
        entry: DiaryEntry,
        avatar_url: Option<Url>,
    },
}

/// Collect the entries newer than `cursor` from a newest-first list.
///
/// A `None` cursor never matches, so every entry in the window is new.
/// Entries without a title are skipped but still use up a window slot.
pub fn collect_delta(raws: &[RawEntry<'_>], cursor: Option<&str>, base: &Url) -> ScrapeOutcome {
    let mut batch = Vec::new();

    for (position, raw) in raws.iter().take(LOOKAHEAD_WINDOW).enumerate() {
        match raw.title(cursor) {
            TitleCheck::Seen if batch.is_empty() => return ScrapeOutcome::NoNewEntries,
            TitleCheck::Seen => break,
            TitleCheck::Missing => {
                debug!(position, "skipping entry without a title");
            }
            TitleCheck::Fresh(title) => batch.push(raw.to_entry(title, base)),
        }
    }

    match batch.first() {
        Some(newest) => ScrapeOutcome::HasEntries {
            newest_title: newest.title.clone(),
            entries: batch,
        },
        None => ScrapeOutcome::NoNewEntries,
    }
}

/// Run [`collect_delta`] over a fetched body.
pub fn delta_from_body(body: &str, kind: FeedKind, base: &Url, cursor: Option<&str>) -> ScrapeOutcome {
    let Some(document) = FeedDocument::parse(body, kind) else {
        return ScrapeOutcome::Invalid(InvalidReason::NotFound);
    };
    match document.entries() {
        ParsedEntries::NoEntries => ScrapeOutcome::NoNewEntries,
        ParsedEntries::Entries(raws) => collect_delta(&raws, cursor, base),
    }
}

/// The newest usable entry of a fetched body, for seeding a cursor.
pub fn newest_from_body(
    body: &str,
    kind: FeedKind,
    base: &Url,
) -> Result<Option<DiaryEntry>, InvalidReason> {
    match delta_from_body(body, kind, base, None) {
        ScrapeOutcome::Invalid(reason) => Err(reason),
        ScrapeOutcome::NoNewEntries => Ok(None),
        ScrapeOutcome::HasEntries { entries, .. } => Ok(entries.into_iter().next()),
    }
}

/// Fetches and scrapes profiles. Parsing runs on the blocking pool.
#[derive(Clone, Debug)]
pub struct Scraper {
    client: FeedClient,
    kind: FeedKind,
}

impl Scraper {
    pub fn new(client: FeedClient, kind: FeedKind) -> Self {
        Self { client, kind }
    }

    pub fn client(&self) -> &FeedClient {
        &self.client
    }

    pub fn kind(&self) -> FeedKind {
        self.kind
    }

    /// Entries newer than `cursor`, at most [`LOOKAHEAD_WINDOW`] of them.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn scrape_delta(&self, profile: &str, cursor: Option<&str>) -> ScrapeOutcome {
        let body = match self.fetch_body(profile).await {
            Ok(body) => body,
            Err(reason) => return ScrapeOutcome::Invalid(reason),
        };

        let kind = self.kind;
        let base = self.client.base_url().clone();
        let cursor = cursor.map(str::to_string);
        let parsed = tokio::task::spawn_blocking(move || {
            delta_from_body(&body, kind, &base, cursor.as_deref())
        })
        .await;

        match parsed {
            Ok(outcome) => {
                if let ScrapeOutcome::HasEntries { entries, .. } = &outcome {
                    info!(new_entries = entries.len(), "found new diary entries");
                }
                outcome
            }
            Err(e) => {
                error!("feed parsing task failed: {}", e);
                ScrapeOutcome::Invalid(InvalidReason::Unreachable)
            }
        }
    }

    /// Validate a profile and read its newest entry plus avatar.
    #[instrument(skip(self), fields(kind = %self.kind))]
    pub async fn scrape_first(&self, profile: &str) -> FirstScrapeOutcome {
        let body = match self.fetch_body(profile).await {
            Ok(body) => body,
            Err(reason) => return FirstScrapeOutcome::Invalid(reason),
        };

        let kind = self.kind;
        let base = self.client.base_url().clone();
        let newest =
            match tokio::task::spawn_blocking(move || newest_from_body(&body, kind, &base)).await {
                Ok(newest) => newest,
                Err(e) => {
                    error!("feed parsing task failed: {}", e);
                    return FirstScrapeOutcome::Invalid(InvalidReason::Unreachable);
                }
            };

        match newest {
            Err(reason) => FirstScrapeOutcome::Invalid(reason),
            Ok(None) => FirstScrapeOutcome::NoEntriesYet,
            Ok(Some(entry)) => FirstScrapeOutcome::HasEntry {
                entry,
                avatar_url: self.profile_avatar_url(profile).await,
            },
        }
    }

    /// Avatar of a profile. Failures are logged and yield `None`.
    pub async fn profile_avatar_url(&self, profile: &str) -> Option<Url> {
        match self.client.fetch_profile_page(profile).await {
            FetchResult::Ok(page) => {
                let url = avatar_url(&page.body_utf8, self.client.base_url());
                if url.is_none() {
                    warn!(profile, "profile page has no avatar image");
                }
                url
            }
            FetchResult::NotFound => {
                warn!(profile, "profile page not found while looking up avatar");
                None
            }
            FetchResult::TransportError(e) => {
                warn!(profile, "avatar lookup failed: {}", e);
                None
            }
        }
    }

    async fn fetch_body(&self, profile: &str) -> Result<String, InvalidReason> {
        match self.client.fetch(profile, self.kind).await {
            FetchResult::Ok(page) => Ok(page.body_utf8),
            FetchResult::NotFound => {
                info!(profile, "profile not found");
                Err(InvalidReason::NotFound)
            }
            FetchResult::TransportError(e) => {
                warn!(profile, "feed unreachable: {}", e);
                Err(InvalidReason::Unreachable)
            }
        }
    }
}
