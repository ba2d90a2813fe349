//! Field extraction for RSS feed items.
//!
//! The origin adds its own namespace to every item (`letterboxd:filmTitle`,
//! `letterboxd:memberRating`, ...) and embeds an HTML description whose first
//! paragraph holds the poster and whose second paragraph, when present, is
//! either the review text or a "Watched on ..." stamp.

use std::sync::LazyLock;

use rss::Item;
use scraper::{Html, Selector};
use url::Url;

use crate::entries::non_empty_text;

const NAMESPACE: &str = "letterboxd";
const WATCHED_STAMP_PREFIX: &str = "Watched on ";
const MAX_STARS: f64 = 5.0;

static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static IMG: LazyLock<Selector> = LazyLock::new(|| Selector::parse("img[src]").unwrap());

fn extension<'a>(item: &'a Item, name: &str) -> Option<&'a str> {
    item.extensions()
        .get(NAMESPACE)?
        .get(name)?
        .first()?
        .value()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

pub fn title(item: &Item) -> Option<String> {
    extension(item, "filmTitle")
        .or_else(|| item.title().map(str::trim).filter(|t| !t.is_empty()))
        .map(str::to_string)
}

pub fn release_year(item: &Item) -> Option<String> {
    extension(item, "filmYear").map(str::to_string)
}

/// The feed reports stars ("3.5"); entries carry the doubled half-star scale
/// ("7"). The origin only emits half steps between 0.5 and 5; anything else
/// (including "3.3", which becomes "6.6" and renders floored) is not rounded.
/// Values that are not numbers or fall outside 0..=5 pass through untouched.
pub fn rating(item: &Item) -> Option<String> {
    let raw = extension(item, "memberRating")?;
    match raw.parse::<f64>() {
        Ok(stars) if (0.0..=MAX_STARS).contains(&stars) => {
            let doubled = stars * 2.0;
            if doubled.fract() == 0.0 {
                Some(format!("{}", doubled as u8))
            } else {
                Some(doubled.to_string())
            }
        }
        _ => Some(raw.to_string()),
    }
}

/// The item's own link, but only when the description holds review text.
pub fn review_url(item: &Item) -> Option<Url> {
    if has_review(item.description()?) {
        diary_url(item)
    } else {
        None
    }
}

/// A review is a second paragraph that is not the "Watched on" stamp.
pub fn has_review(description: &str) -> bool {
    let fragment = Html::parse_fragment(description);
    fragment
        .select(&PARAGRAPH)
        .nth(1)
        .and_then(|p| non_empty_text(p.text()))
        .is_some_and(|text| !text.starts_with(WATCHED_STAMP_PREFIX))
}

pub fn diary_url(item: &Item) -> Option<Url> {
    Url::parse(item.link()?.trim()).ok()
}

/// Only the literal "No" means a first watch. Items without the element are
/// treated as first watches too.
pub fn is_rewatch(item: &Item) -> bool {
    extension(item, "rewatch").is_some_and(|value| value != "No")
}

pub fn poster_url(item: &Item) -> Option<Url> {
    let fragment = Html::parse_fragment(item.description()?);
    let src = fragment.select(&IMG).next()?.value().attr("src")?;
    Url::parse(src.trim()).ok()
}
