//! Field extraction for the HTML diary table.
//!
//! Each `tr` of the table body carries positional cells; cell 0 is the month
//! badge and cells 1..=7 hold the day (entry permalink), film details,
//! release year, rating, like, rewatch and review markers.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::entries::non_empty_text;

/// Marker class the origin puts on rewatch/review cells that are "off".
const STATUS_OFF_CLASS: &str = "icon-status-off";

static TBODY: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tbody").unwrap());
static TR: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static LINK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());
static SPAN: LazyLock<Selector> = LazyLock::new(|| Selector::parse("span").unwrap());
static RATING_INPUT: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("input[value]").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct DiaryRow<'a> {
    pub day: ElementRef<'a>,
    pub details: ElementRef<'a>,
    pub released: ElementRef<'a>,
    pub rating: ElementRef<'a>,
    pub like: ElementRef<'a>,
    pub rewatch: ElementRef<'a>,
    pub review: ElementRef<'a>,
}

/// Rows of the diary table, or `None` when the page has no table body (the
/// profile has never logged a film).
pub fn rows(html: &Html) -> Option<Vec<DiaryRow<'_>>> {
    let tbody = html.select(&TBODY).next()?;
    Some(tbody.select(&TR).filter_map(DiaryRow::from_row).collect())
}

impl<'a> DiaryRow<'a> {
    /// Rows with fewer than eight cells are layout rows, not entries.
    pub fn from_row(row: ElementRef<'a>) -> Option<Self> {
        let cells: Vec<ElementRef<'a>> = row
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td")
            .collect();

        match cells.as_slice() {
            [_, day, details, released, rating, like, rewatch, review, ..] => Some(Self {
                day: *day,
                details: *details,
                released: *released,
                rating: *rating,
                like: *like,
                rewatch: *rewatch,
                review: *review,
            }),
            _ => None,
        }
    }

    pub fn title(&self) -> Option<String> {
        let link = self.details.select(&LINK).next()?;
        non_empty_text(link.text())
    }

    pub fn release_year(&self) -> Option<String> {
        let span = self.released.select(&SPAN).next()?;
        non_empty_text(span.text())
    }

    pub fn rating(&self) -> Option<String> {
        let input = self.rating.select(&RATING_INPUT).next()?;
        let value = input.value().attr("value")?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }

    pub fn review_url(&self, base: &Url) -> Option<Url> {
        if has_class(self.review, STATUS_OFF_CLASS) {
            return None;
        }
        link_href(self.review, base)
    }

    pub fn diary_url(&self, base: &Url) -> Option<Url> {
        link_href(self.day, base)
    }

    pub fn is_rewatch(&self) -> bool {
        !has_class(self.rewatch, STATUS_OFF_CLASS)
    }

    /// Best effort: the table is lazy-loaded, so this is often a placeholder.
    pub fn poster_url(&self, base: &Url) -> Option<Url> {
        let img = self.details.select(&IMG).next()?;
        base.join(img.value().attr("src")?.trim()).ok()
    }
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn link_href(el: ElementRef<'_>, base: &Url) -> Option<Url> {
    let href = el.select(&LINK).next()?.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }
    base.join(href).ok()
}
