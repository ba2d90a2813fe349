use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetcher::errors::FetchError;

/// The two representations of a profile's diary the origin serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedKind {
    /// The paginated HTML diary table.
    Diary,
    /// The RSS feed of recent activity.
    Rss,
}

impl FeedKind {
    /// Path of the feed relative to the profile root.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Diary => "films/diary/",
            Self::Rss => "rss/",
        }
    }
}

impl Display for FeedKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Diary => f.write_str("diary"),
            Self::Rss => f.write_str("rss"),
        }
    }
}

impl FromStr for FeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "diary" | "html" => Ok(Self::Diary),
            "rss" => Ok(Self::Rss),
            other => Err(format!("unknown feed kind '{other}' (expected 'rss' or 'diary')")),
        }
    }
}

#[derive(Debug)]
pub struct PageResponse {
    pub url_final: Url,
    pub status: StatusCode,
    pub body_utf8: String,
    pub fetched_at: DateTime<Utc>,
}

/// Classified outcome of one page request.
#[derive(Debug)]
pub enum FetchResult {
    Ok(PageResponse),
    /// Non-200 status, a "not found" page, or a slug that cannot name a profile.
    NotFound,
    TransportError(FetchError),
}
