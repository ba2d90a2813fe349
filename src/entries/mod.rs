pub mod avatar;
pub mod diary;
pub mod feed;

#[cfg(test)]
mod tests;

use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetcher::FeedKind;

pub use diary::DiaryRow;

/// One diary entry as shown to the channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiaryEntry {
    pub title: String,
    pub release_year: Option<String>,
    /// Half-star scale: "0" through "10", where "7" is three and a half stars.
    pub rating: Option<String>,
    pub review_url: Option<Url>,
    pub diary_url: Option<Url>,
    pub is_rewatch: bool,
    pub poster_url: Option<Url>,
}

/// Result of pulling an entry's title and comparing it to the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleCheck {
    /// A title that differs from the cursor.
    Fresh(String),
    /// The title equals the cursor: this entry was already announced.
    Seen,
    /// The entry has no usable title.
    Missing,
}

impl TitleCheck {
    /// `cursor == None` never matches, so the newest entry is always captured.
    fn compare(title: Option<String>, cursor: Option<&str>) -> Self {
        match title {
            None => Self::Missing,
            Some(title) if cursor == Some(title.as_str()) => Self::Seen,
            Some(title) => Self::Fresh(title),
        }
    }
}

/// A parsed feed document. Entries borrow from it.
#[derive(Debug)]
pub enum FeedDocument {
    Diary(Html),
    Rss(rss::Channel),
}

/// The entries a document holds, newest first.
#[derive(Debug)]
pub enum ParsedEntries<'a> {
    /// The profile exists but has never logged anything.
    NoEntries,
    Entries(Vec<RawEntry<'a>>),
}

impl FeedDocument {
    /// Parse a fetched body. `None` means the body cannot belong to a profile
    /// (an RSS document without a channel).
    pub fn parse(body: &str, kind: FeedKind) -> Option<Self> {
        match kind {
            FeedKind::Diary => Some(Self::Diary(Html::parse_document(body))),
            FeedKind::Rss => rss::Channel::read_from(body.as_bytes()).ok().map(Self::Rss),
        }
    }

    pub fn entries(&self) -> ParsedEntries<'_> {
        let entries: Vec<RawEntry<'_>> = match self {
            Self::Diary(html) => match diary::rows(html) {
                Some(rows) => rows.into_iter().map(RawEntry::Row).collect(),
                None => return ParsedEntries::NoEntries,
            },
            Self::Rss(channel) => channel.items().iter().map(RawEntry::Item).collect(),
        };

        if entries.is_empty() {
            ParsedEntries::NoEntries
        } else {
            ParsedEntries::Entries(entries)
        }
    }
}

/// One unprocessed diary record, from either feed kind. Fields are extracted
/// on demand so the title can be checked before anything else is read.
#[derive(Debug, Clone, Copy)]
pub enum RawEntry<'a> {
    Row(DiaryRow<'a>),
    Item(&'a rss::Item),
}

impl RawEntry<'_> {
    pub fn title(&self, cursor: Option<&str>) -> TitleCheck {
        let title = match self {
            Self::Row(row) => row.title(),
            Self::Item(item) => feed::title(item),
        };
        TitleCheck::compare(title, cursor)
    }

    pub fn release_year(&self) -> Option<String> {
        match self {
            Self::Row(row) => row.release_year(),
            Self::Item(item) => feed::release_year(item),
        }
    }

    pub fn rating(&self) -> Option<String> {
        match self {
            Self::Row(row) => row.rating(),
            Self::Item(item) => feed::rating(item),
        }
    }

    pub fn review_url(&self, base: &Url) -> Option<Url> {
        match self {
            Self::Row(row) => row.review_url(base),
            Self::Item(item) => feed::review_url(item),
        }
    }

    pub fn diary_url(&self, base: &Url) -> Option<Url> {
        match self {
            Self::Row(row) => row.diary_url(base),
            Self::Item(item) => feed::diary_url(item),
        }
    }

    pub fn is_rewatch(&self) -> bool {
        match self {
            Self::Row(row) => row.is_rewatch(),
            Self::Item(item) => feed::is_rewatch(item),
        }
    }

    pub fn poster_url(&self, base: &Url) -> Option<Url> {
        match self {
            Self::Row(row) => row.poster_url(base),
            Self::Item(item) => feed::poster_url(item),
        }
    }

    /// Extract the remaining fields for an entry whose title was already read.
    pub fn to_entry(&self, title: String, base: &Url) -> DiaryEntry {
        DiaryEntry {
            title,
            release_year: self.release_year(),
            rating: self.rating(),
            review_url: self.review_url(base),
            diary_url: self.diary_url(base),
            is_rewatch: self.is_rewatch(),
            poster_url: self.poster_url(base),
        }
    }
}

/// Text content of an element with surrounding whitespace removed, or `None`
/// when nothing is left.
pub(crate) fn non_empty_text<'a>(text: impl Iterator<Item = &'a str>) -> Option<String> {
    let text = text.collect::<String>();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
