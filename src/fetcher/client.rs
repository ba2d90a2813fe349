use chrono::Utc;
use reqwest::{
    Client, ClientBuilder, StatusCode,
    header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::FetcherConfig;
use crate::fetcher::{
    errors::FetchError,
    pipeline::{decode_body, is_not_found_page},
    types::{FeedKind, FetchResult, PageResponse},
};

const MAX_BODY_SIZE: u64 = 5 * 1024 * 1024; // 5MB
const MAX_SLUG_LEN: usize = 64;

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const RSS_ACCEPT: &str = "application/rss+xml,application/xml;q=0.9,text/xml;q=0.8,*/*;q=0.5";
const RSS_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

/// HTTP client for the feed origin. Every request carries the configured
/// browser identity and timeout; nothing is retried here.
#[derive(Clone, Debug)]
pub struct FeedClient {
    http: Client,
    base_url: Url,
}

impl FeedClient {
    pub fn new(config: &FetcherConfig) -> Result<Self, FetchError> {
        let http = ClientBuilder::new()
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Unknown(e.to_string()))?;

        // `Url::join` drops the last path segment unless it ends in a slash.
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying client, shared with other outbound collaborators.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn profile_url(&self, profile: &str) -> Result<Url, FetchError> {
        Ok(self.base_url.join(&format!("{profile}/"))?)
    }

    pub fn feed_url(&self, profile: &str, kind: FeedKind) -> Result<Url, FetchError> {
        Ok(self.profile_url(profile)?.join(kind.path_segment())?)
    }

    /// Fetch a profile's diary page or RSS feed.
    #[instrument(skip(self), fields(profile = %profile, kind = %kind))]
    pub async fn fetch(&self, profile: &str, kind: FeedKind) -> FetchResult {
        if !is_valid_profile_slug(profile) {
            debug!("rejecting malformed profile slug");
            return FetchResult::NotFound;
        }
        match self.feed_url(profile, kind) {
            Ok(url) => self.get(url, kind == FeedKind::Rss).await,
            Err(e) => FetchResult::TransportError(e),
        }
    }

    /// Fetch the profile root page (used for the avatar).
    #[instrument(skip(self), fields(profile = %profile))]
    pub async fn fetch_profile_page(&self, profile: &str) -> FetchResult {
        if !is_valid_profile_slug(profile) {
            return FetchResult::NotFound;
        }
        match self.profile_url(profile) {
            Ok(url) => self.get(url, false).await,
            Err(e) => FetchResult::TransportError(e),
        }
    }

    async fn get(&self, url: Url, rss: bool) -> FetchResult {
        let mut headers = HeaderMap::new();
        if rss {
            headers.insert(ACCEPT, HeaderValue::from_static(RSS_ACCEPT));
            headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(RSS_ACCEPT_LANGUAGE));
        } else {
            headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
        }

        let response = match self.http.get(url.clone()).headers(headers).send().await {
            Ok(response) => response,
            Err(e) => {
                let err = FetchError::from_reqwest_error(e);
                warn!(%url, "request failed: {}", err);
                return FetchResult::TransportError(err);
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            debug!(%url, %status, "treating non-200 response as missing profile");
            return FetchResult::NotFound;
        }

        if let Some(content_length) = response.content_length()
            && content_length > MAX_BODY_SIZE
        {
            return FetchResult::TransportError(FetchError::BodyTooLarge(content_length));
        }

        let url_final = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|ct| ct.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let body_bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return FetchResult::TransportError(FetchError::from_reqwest_error(e)),
        };
        if body_bytes.len() as u64 > MAX_BODY_SIZE {
            return FetchResult::TransportError(FetchError::BodyTooLarge(body_bytes.len() as u64));
        }

        let body_utf8 = match decode_body(&content_type, &body_bytes) {
            Ok(body) => body,
            Err(e) => return FetchResult::TransportError(e),
        };

        if !rss && is_not_found_page(&body_utf8) {
            debug!(%url, "origin served a not-found page");
            return FetchResult::NotFound;
        }

        FetchResult::Ok(PageResponse {
            url_final,
            status,
            body_utf8,
            fetched_at: Utc::now(),
        })
    }
}

/// Profile slugs are ASCII letters, digits and underscores.
pub fn is_valid_profile_slug(profile: &str) -> bool {
    !profile.is_empty()
        && profile.len() <= MAX_SLUG_LEN
        && profile
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
