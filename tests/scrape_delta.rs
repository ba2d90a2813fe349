use diarywatch::config::FetcherConfig;
use diarywatch::fetcher::{FeedClient, FeedKind};
use diarywatch::scrape::{FirstScrapeOutcome, InvalidReason, ScrapeOutcome, Scraper};
use url::Url;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const FEED: &str = include_str!("../src/entries/tests/fixtures/feed.xml");
const FEED_EMPTY: &str = include_str!("../src/entries/tests/fixtures/feed_empty.xml");
const DIARY: &str = include_str!("../src/entries/tests/fixtures/diary.html");
const PROFILE: &str = include_str!("../src/entries/tests/fixtures/profile.html");

async fn serve(server: &MockServer, route: &str, body: &str, content_type: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", content_type),
        )
        .mount(server)
        .await;
}

fn scraper(server: &MockServer, kind: FeedKind) -> Scraper {
    let client =
        FeedClient::new(&FetcherConfig::new(Url::parse(&server.uri()).unwrap())).unwrap();
    Scraper::new(client, kind)
}

fn titles(outcome: &ScrapeOutcome) -> Vec<&str> {
    match outcome {
        ScrapeOutcome::HasEntries { entries, .. } => {
            entries.iter().map(|e| e.title.as_str()).collect()
        }
        other => panic!("Expected entries, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rss_delta_stops_at_cursor() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/rss/", FEED, "application/rss+xml").await;
    let scraper = scraper(&mock_server, FeedKind::Rss);

    let outcome = scraper.scrape_delta("jane", Some("Paddington 2")).await;
    assert_eq!(titles(&outcome), vec!["Dune: Part Two", "Heat"]);

    let ScrapeOutcome::HasEntries {
        entries,
        newest_title,
    } = outcome
    else {
        unreachable!()
    };
    assert_eq!(newest_title, "Dune: Part Two");
    assert_eq!(entries[0].rating.as_deref(), Some("9"));
    assert!(entries[0].review_url.is_some());
    assert!(entries[1].is_rewatch);
    assert!(entries[1].review_url.is_none());
}

#[tokio::test]
async fn test_rss_delta_cursor_on_newest_is_quiet() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/rss/", FEED, "application/rss+xml").await;

    let outcome = scraper(&mock_server, FeedKind::Rss)
        .scrape_delta("jane", Some("Dune: Part Two"))
        .await;
    assert_eq!(outcome, ScrapeOutcome::NoNewEntries);
}

#[tokio::test]
async fn test_rss_delta_is_bounded_by_window() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/rss/", FEED, "application/rss+xml").await;
    let scraper = scraper(&mock_server, FeedKind::Rss);

    let expected = vec![
        "Dune: Part Two",
        "Heat",
        "Paddington 2",
        "Past Lives",
        "Aftersun",
    ];
    assert_eq!(titles(&scraper.scrape_delta("jane", None).await), expected);
    assert_eq!(
        titles(&scraper.scrape_delta("jane", Some("Perfect Days")).await),
        expected
    );
}

#[tokio::test]
async fn test_rss_empty_feed_has_nothing_new() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/quiet/rss/", FEED_EMPTY, "application/rss+xml").await;

    let outcome = scraper(&mock_server, FeedKind::Rss)
        .scrape_delta("quiet", None)
        .await;
    assert_eq!(outcome, ScrapeOutcome::NoNewEntries);
}

#[tokio::test]
async fn test_diary_delta() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/films/diary/", DIARY, "text/html; charset=utf-8").await;

    let outcome = scraper(&mock_server, FeedKind::Diary)
        .scrape_delta("jane", Some("Heat"))
        .await;
    assert_eq!(titles(&outcome), vec!["Dune: Part Two"]);

    let ScrapeOutcome::HasEntries { entries, .. } = outcome else {
        unreachable!()
    };
    let diary_url = entries[0].diary_url.as_ref().unwrap();
    assert!(diary_url.as_str().starts_with(&mock_server.uri()));
}

#[tokio::test]
async fn test_missing_profile_is_invalid() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;
    let scraper = scraper(&mock_server, FeedKind::Rss);

    assert_eq!(
        scraper.scrape_delta("ghost", Some("x")).await,
        ScrapeOutcome::Invalid(InvalidReason::NotFound)
    );
    assert_eq!(
        scraper.scrape_first("ghost").await,
        FirstScrapeOutcome::Invalid(InvalidReason::NotFound)
    );
}

#[tokio::test]
async fn test_unreachable_origin_is_invalid() {
    let client =
        FeedClient::new(&FetcherConfig::new(Url::parse("http://127.0.0.1:1/").unwrap())).unwrap();
    let scraper = Scraper::new(client, FeedKind::Rss);

    assert_eq!(
        scraper.scrape_delta("jane", None).await,
        ScrapeOutcome::Invalid(InvalidReason::Unreachable)
    );
}

#[tokio::test]
async fn test_first_scrape_reads_newest_and_avatar() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/rss/", FEED, "application/rss+xml").await;
    serve(&mock_server, "/jane/", PROFILE, "text/html; charset=utf-8").await;

    match scraper(&mock_server, FeedKind::Rss).scrape_first("jane").await {
        FirstScrapeOutcome::HasEntry { entry, avatar_url } => {
            assert_eq!(entry.title, "Dune: Part Two");
            assert_eq!(entry.release_year.as_deref(), Some("2024"));
            assert_eq!(
                avatar_url.as_ref().map(Url::as_str),
                Some("https://a.ltrbxd.com/resized/avatar/upload/jane-0-220-0-220-crop.jpg")
            );
        }
        other => panic!("Expected an entry, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_scrape_without_avatar_page() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/jane/rss/", FEED, "application/rss+xml").await;

    match scraper(&mock_server, FeedKind::Rss).scrape_first("jane").await {
        FirstScrapeOutcome::HasEntry { avatar_url, .. } => assert!(avatar_url.is_none()),
        other => panic!("Expected an entry, got {other:?}"),
    }
}

#[tokio::test]
async fn test_first_scrape_of_empty_feed() {
    let mock_server = MockServer::start().await;
    serve(&mock_server, "/quiet/rss/", FEED_EMPTY, "application/rss+xml").await;

    assert_eq!(
        scraper(&mock_server, FeedKind::Rss).scrape_first("quiet").await,
        FirstScrapeOutcome::NoEntriesYet
    );
}
