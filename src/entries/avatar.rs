use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

static AVATAR_IMG: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".profile-avatar img[src], span.avatar img[src]").unwrap());

/// Avatar image of a profile root page.
pub fn avatar_url(html: &str, base: &Url) -> Option<Url> {
    let document = Html::parse_document(html);
    let src = document.select(&AVATAR_IMG).next()?.value().attr("src")?.trim();
    if src.is_empty() {
        return None;
    }
    base.join(src).ok()
}
