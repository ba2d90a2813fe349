//! Turns diary entries into chat-embed shaped display units.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::RenderConfig;
use crate::entries::DiaryEntry;

pub const EMBED_COLOR: u32 = 0x1DB954;
pub const NO_RATING_TEXT: &str = "*No rating provided.*";
pub const INVALID_RATING_TEXT: &str = "*Invalid rating format.*";
pub const REVIEW_FIELD_NAME: &str = "Review";

const MAX_RATING: f64 = 10.0;

/// Who logged the entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presenter {
    pub url: Url,
    pub name: String,
    pub avatar_url: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

/// One notification message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayUnit {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<Thumbnail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
}

impl DisplayUnit {
    pub fn review(&self) -> Option<&EmbedField> {
        self.fields.iter().find(|f| f.name == REVIEW_FIELD_NAME)
    }
}

/// One unit per entry, in the same order.
pub fn render(entries: &[DiaryEntry], presenter: &Presenter, config: &RenderConfig) -> Vec<DisplayUnit> {
    entries
        .iter()
        .map(|entry| render_entry(entry, presenter, config))
        .collect()
}

pub fn render_entry(entry: &DiaryEntry, presenter: &Presenter, config: &RenderConfig) -> DisplayUnit {
    let title = match &entry.release_year {
        Some(year) => format!("{} ({})", entry.title, year),
        None => entry.title.clone(),
    };

    let author_name = if entry.is_rewatch {
        format!("{} Rewatched 🔁", presenter.name)
    } else {
        format!("{} Watched 🎦", presenter.name)
    };

    let fields = entry
        .review_url
        .iter()
        .map(|review| EmbedField {
            name: REVIEW_FIELD_NAME.to_string(),
            value: review.to_string(),
            inline: false,
        })
        .collect();

    DisplayUnit {
        title,
        description: rating_text(entry.rating.as_deref(), config),
        url: entry.diary_url.as_ref().map(Url::to_string),
        color: EMBED_COLOR,
        thumbnail: entry.poster_url.as_ref().map(|poster| Thumbnail {
            url: poster.to_string(),
        }),
        author: Some(Author {
            name: author_name,
            url: presenter.url.to_string(),
            icon_url: presenter.avatar_url.as_ref().map(Url::to_string),
        }),
        fields,
    }
}

/// Star glyphs for a half-star scale rating ("7" is three and a half stars).
/// Anything outside "0".."10" is reported as invalid.
pub fn rating_text(rating: Option<&str>, config: &RenderConfig) -> String {
    let raw = match rating.map(str::trim) {
        None | Some("0") => return NO_RATING_TEXT.to_string(),
        Some(raw) => raw,
    };

    let stars = match raw.parse::<f64>() {
        Ok(value) if (0.0..=MAX_RATING).contains(&value) => value / 2.0,
        _ => return INVALID_RATING_TEXT.to_string(),
    };

    let mut text = config.star_glyph.repeat(stars.trunc() as usize);
    if stars.fract() >= 0.5 {
        text.push_str(&config.half_star_glyph);
    }
    text
}
