use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

pub const OMDB_ENDPOINT: &str = "http://www.omdbapi.com/";

/// Movie-metadata lookup used when a feed entry carries no poster.
#[async_trait]
pub trait PosterLookup: Send + Sync {
    async fn poster(&self, title: &str, year: Option<&str>) -> Option<Url>;
}

#[derive(Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

/// OMDb-style title search. Any failure means "no poster".
#[derive(Clone, Debug)]
pub struct OmdbPosters {
    http: Client,
    endpoint: Url,
    api_key: String,
}

impl OmdbPosters {
    pub fn new(http: Client, endpoint: Url, api_key: impl Into<String>) -> Self {
        Self {
            http,
            endpoint,
            api_key: api_key.into(),
        }
    }
}

#[async_trait]
impl PosterLookup for OmdbPosters {
    async fn poster(&self, title: &str, year: Option<&str>) -> Option<Url> {
        let mut query = vec![
            ("apikey", self.api_key.as_str()),
            ("t", title),
            ("type", "movie"),
        ];
        if let Some(year) = year {
            query.push(("y", year));
        }

        let response = match self.http.get(self.endpoint.clone()).query(&query).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(title, status = %response.status(), "poster lookup rejected");
                return None;
            }
            Err(e) => {
                warn!(title, "poster lookup failed: {}", e);
                return None;
            }
        };

        let body: OmdbResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(title, "poster lookup returned unexpected body: {}", e);
                return None;
            }
        };

        let poster = body.poster.filter(|p| p != "N/A")?;
        debug!(title, %poster, "poster found");
        Url::parse(&poster).ok()
    }
}
