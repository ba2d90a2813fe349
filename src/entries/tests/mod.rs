use std::fs;

use url::Url;

use crate::entries::{FeedDocument, ParsedEntries, RawEntry, TitleCheck, avatar, feed};
use crate::fetcher::FeedKind;

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/entries/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn base() -> Url {
    Url::parse("https://letterboxd.com/").unwrap()
}

fn entries_of(doc: &FeedDocument) -> Vec<RawEntry<'_>> {
    match doc.entries() {
        ParsedEntries::Entries(entries) => entries,
        ParsedEntries::NoEntries => panic!("expected entries"),
    }
}

fn fresh_title(raw: &RawEntry<'_>) -> String {
    match raw.title(None) {
        TitleCheck::Fresh(title) => title,
        other => panic!("expected a title, got {other:?}"),
    }
}

#[test]
fn test_diary_rows_extract_all_fields() {
    let doc = FeedDocument::parse(&fixture("diary.html"), FeedKind::Diary).unwrap();
    let entries = entries_of(&doc);
    assert_eq!(entries.len(), 3);

    let dune = entries[0].to_entry(fresh_title(&entries[0]), &base());
    assert_eq!(dune.title, "Dune: Part Two");
    assert_eq!(dune.release_year.as_deref(), Some("2024"));
    assert_eq!(dune.rating.as_deref(), Some("9"));
    assert_eq!(
        dune.review_url.as_ref().map(Url::as_str),
        Some("https://letterboxd.com/jane/film/dune-part-two/")
    );
    assert_eq!(
        dune.diary_url.as_ref().map(Url::as_str),
        Some("https://letterboxd.com/jane/film/dune-part-two/")
    );
    assert!(!dune.is_rewatch);
    assert_eq!(
        dune.poster_url.as_ref().map(Url::as_str),
        Some("https://a.ltrbxd.com/resized/dune-part-two-0-70-0-105.jpg")
    );

    let heat = entries[1].to_entry(fresh_title(&entries[1]), &base());
    assert_eq!(heat.title, "Heat");
    assert_eq!(heat.rating.as_deref(), Some("10"));
    assert!(heat.is_rewatch);
    assert!(heat.review_url.is_none());
    assert_eq!(
        heat.diary_url.as_ref().map(Url::as_str),
        Some("https://letterboxd.com/jane/film/heat-1995/1/")
    );
}

#[test]
fn test_diary_title_is_trimmed_and_rating_optional() {
    let doc = FeedDocument::parse(&fixture("diary.html"), FeedKind::Diary).unwrap();
    let entries = entries_of(&doc);

    let paddington = entries[2].to_entry(fresh_title(&entries[2]), &base());
    assert_eq!(paddington.title, "Paddington 2");
    assert_eq!(paddington.rating, None);
    assert_eq!(paddington.poster_url, None);
    assert!(!paddington.is_rewatch);
}

#[test]
fn test_diary_without_table_has_no_entries() {
    let doc = FeedDocument::parse(&fixture("diary_empty.html"), FeedKind::Diary).unwrap();
    assert!(matches!(doc.entries(), ParsedEntries::NoEntries));
}

#[test]
fn test_title_check_against_cursor() {
    let doc = FeedDocument::parse(&fixture("diary.html"), FeedKind::Diary).unwrap();
    let entries = entries_of(&doc);

    assert_eq!(entries[0].title(Some("Dune: Part Two")), TitleCheck::Seen);
    assert_eq!(
        entries[0].title(Some("Heat")),
        TitleCheck::Fresh("Dune: Part Two".to_string())
    );
    // Comparison is exact: no case folding.
    assert_eq!(
        entries[1].title(Some("heat")),
        TitleCheck::Fresh("Heat".to_string())
    );
}

#[test]
fn test_diary_row_without_title_is_missing() {
    let html = r#"<html><body><table><tbody><tr>
        <td></td><td><a href="/x/film/y/">1</a></td><td><h3></h3></td><td></td>
        <td></td><td></td><td></td><td></td>
    </tr></tbody></table></body></html>"#;
    let doc = FeedDocument::parse(html, FeedKind::Diary).unwrap();
    let entries = entries_of(&doc);
    assert_eq!(entries[0].title(None), TitleCheck::Missing);
}

#[test]
fn test_short_rows_are_not_entries() {
    let html = r#"<html><body><table><tbody>
        <tr><td colspan="9">Nothing to see</td></tr>
    </tbody></table></body></html>"#;
    let doc = FeedDocument::parse(html, FeedKind::Diary).unwrap();
    assert!(matches!(doc.entries(), ParsedEntries::NoEntries));
}

#[test]
fn test_rss_items_extract_all_fields() {
    let doc = FeedDocument::parse(&fixture("feed.xml"), FeedKind::Rss).unwrap();
    let entries = entries_of(&doc);
    assert_eq!(entries.len(), 6);

    let dune = entries[0].to_entry(fresh_title(&entries[0]), &base());
    assert_eq!(dune.title, "Dune: Part Two");
    assert_eq!(dune.release_year.as_deref(), Some("2024"));
    assert_eq!(dune.rating.as_deref(), Some("9"));
    assert!(!dune.is_rewatch);
    assert_eq!(
        dune.review_url.as_ref().map(Url::as_str),
        Some("https://letterboxd.com/jane/film/dune-part-two/")
    );
    assert_eq!(dune.review_url, dune.diary_url);
    assert_eq!(
        dune.poster_url.as_ref().map(Url::as_str),
        Some("https://a.ltrbxd.com/resized/dune-part-two-0-600-0-900.jpg")
    );

    let heat = entries[1].to_entry(fresh_title(&entries[1]), &base());
    assert_eq!(heat.rating.as_deref(), Some("10"));
    assert!(heat.is_rewatch);
    assert!(heat.review_url.is_none());

    let paddington = entries[2].to_entry(fresh_title(&entries[2]), &base());
    assert_eq!(paddington.rating, None);
    assert!(paddington.review_url.is_none());

    let past_lives = entries[3].to_entry(fresh_title(&entries[3]), &base());
    assert!(past_lives.review_url.is_some());

    let aftersun = entries[4].to_entry(fresh_title(&entries[4]), &base());
    assert_eq!(aftersun.rating.as_deref(), Some("7"));
}

#[test]
fn test_rss_channel_without_items_has_no_entries() {
    let doc = FeedDocument::parse(&fixture("feed_empty.xml"), FeedKind::Rss).unwrap();
    assert!(matches!(doc.entries(), ParsedEntries::NoEntries));
}

#[test]
fn test_rss_without_channel_is_invalid() {
    let html = "<html><head><title>Not Found</title></head><body></body></html>";
    assert!(FeedDocument::parse(html, FeedKind::Rss).is_none());
}

#[test]
fn test_review_detection() {
    assert!(!feed::has_review("<p>Watched on Friday May 10, 2024.</p>"));
    assert!(!feed::has_review(
        r#"<p><img src="https://a.ltrbxd.com/p.jpg"/></p> <p>Watched on Friday May 10, 2024.</p>"#
    ));
    assert!(feed::has_review(
        r#"<p><img src="https://a.ltrbxd.com/p.jpg"/></p> <p>Loved every minute.</p>"#
    ));
    assert!(!feed::has_review(r#"<p><img src="https://a.ltrbxd.com/p.jpg"/></p> <p>  </p>"#));
    assert!(!feed::has_review(""));
}

#[test]
fn test_rss_rewatch_and_rating_edge_cases() {
    let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:letterboxd="https://letterboxd.com">
  <channel>
    <title>Letterboxd - Jane</title>
    <link>https://letterboxd.com/jane/</link>
    <description>Letterboxd - Jane</description>
    <item>
      <title>Fallback Title, 2001</title>
      <link>https://letterboxd.com/jane/film/fallback/</link>
      <letterboxd:rewatch>Maybe</letterboxd:rewatch>
      <letterboxd:memberRating>two</letterboxd:memberRating>
    </item>
    <item>
      <link>https://letterboxd.com/jane/film/untitled/</link>
    </item>
  </channel>
</rss>"#;
    let doc = FeedDocument::parse(xml, FeedKind::Rss).unwrap();
    let entries = entries_of(&doc);

    let fallback = entries[0].to_entry(fresh_title(&entries[0]), &base());
    assert_eq!(fallback.title, "Fallback Title, 2001");
    assert!(fallback.is_rewatch);
    assert_eq!(fallback.rating.as_deref(), Some("two"));
    assert_eq!(fallback.release_year, None);
    assert_eq!(fallback.poster_url, None);

    assert_eq!(entries[1].title(None), TitleCheck::Missing);
    assert!(!entries[1].is_rewatch());
}

#[test]
fn test_rss_rating_outside_scale_is_not_converted() {
    let item = |rating: &str| {
        format!(
            "<item><title>Heat</title><link>https://letterboxd.com/jane/film/heat/</link>\
             <letterboxd:memberRating>{rating}</letterboxd:memberRating></item>"
        )
    };
    let xml = format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:letterboxd="https://letterboxd.com"><channel>
<title>Letterboxd - Jane</title><link>https://letterboxd.com/jane/</link>
<description>Letterboxd - Jane</description>{}{}{}{}</channel></rss>"#,
        item("1e300"),
        item("5.5"),
        item("-1"),
        item("3.3")
    );
    let doc = FeedDocument::parse(&xml, FeedKind::Rss).unwrap();
    let ratings: Vec<Option<String>> = entries_of(&doc).iter().map(RawEntry::rating).collect();

    assert_eq!(
        ratings,
        vec![
            Some("1e300".to_string()),
            Some("5.5".to_string()),
            Some("-1".to_string()),
            Some("6.6".to_string()),
        ]
    );
}

#[test]
fn test_avatar_from_profile_page() {
    let url = avatar::avatar_url(&fixture("profile.html"), &base());
    assert_eq!(
        url.as_ref().map(Url::as_str),
        Some("https://a.ltrbxd.com/resized/avatar/upload/jane-0-220-0-220-crop.jpg")
    );
    assert!(avatar::avatar_url(&fixture("diary_empty.html"), &base()).is_none());
}

#[cfg(feature = "fuzz")]
mod fuzz {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn test_parse_never_panics(body in ".*") {
            for kind in [FeedKind::Diary, FeedKind::Rss] {
                if let Some(doc) = FeedDocument::parse(&body, kind)
                    && let ParsedEntries::Entries(entries) = doc.entries()
                {
                    for raw in entries {
                        if let TitleCheck::Fresh(title) = raw.title(None) {
                            let _ = raw.to_entry(title, &base());
                        }
                    }
                }
            }
        }

        #[test]
        fn test_review_detection_never_panics(description in ".*") {
            let _ = feed::has_review(&description);
        }
    }
}
