//! Jamendo catalog client: track search and recommendations

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use super::types::{ItemId, Song};
use crate::{log_api_request, log_api_result};

pub const PAGE_SIZE: usize = 20;
pub const DEFAULT_API_BASE: &str = "https://api.jamendo.com/v3.0";
pub const DEFAULT_CLIENT_ID: &str = "7bbfce21";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Catalog returned status {0}")]
    Status(StatusCode),
    #[error("Invalid catalog URL: {0}")]
    Url(#[from] url::ParseError),
}

/// A track listed by the catalog
#[derive(Clone, Debug, PartialEq)]
pub struct CatalogTrack {
    pub id: ItemId,
    pub title: String,
    pub artist: String,
    pub cover_url: Option<String>,
    pub url: String,
}

impl CatalogTrack {
    /// Library song for this track, keyed by the textual catalog id
    pub fn to_song(&self) -> Song {
        Song {
            id: ItemId::Text(self.id.to_string()),
            title: self.title.clone(),
            artist: self.artist.clone(),
            url: self.url.clone(),
            cover_url: self.cover_url.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogPage {
    pub tracks: Vec<CatalogTrack>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    headers: ResponseHeaders,
    #[serde(default)]
    results: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct ResponseHeaders {
    #[serde(default)]
    results_count: usize,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: ItemId,
    name: String,
    #[serde(default)]
    artist_name: String,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    audio: String,
}

impl From<TracksResponse> for CatalogPage {
    fn from(response: TracksResponse) -> Self {
        let tracks = response
            .results
            .into_iter()
            .map(|raw| CatalogTrack {
                id: raw.id,
                title: raw.name,
                artist: raw.artist_name,
                cover_url: raw.image.filter(|i| !i.is_empty()),
                url: raw.audio,
            })
            .collect();
        Self {
            tracks,
            total: response.headers.results_count,
        }
    }
}

#[derive(Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
}

impl CatalogClient {
    pub fn new(base_url: &str, client_id: &str) -> Result<Self, CatalogError> {
        Url::parse(base_url)?;
        let http = reqwest::Client::builder()
            .user_agent(concat!("musicbox/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
        })
    }

    pub async fn search(&self, query: &str, offset: usize) -> Result<CatalogPage, CatalogError> {
        log_api_request!("search", query, offset);
        let url = self.tracks_url(
            offset,
            &[("search", query), ("include", "musicinfo"), ("groupby", "artist_id")],
        )?;
        let result = self.fetch(url).await;
        log_api_result!("search", result);
        result
    }

    pub async fn recommendations(&self, offset: usize) -> Result<CatalogPage, CatalogError> {
        log_api_request!("recommendations", offset);
        let url = self.tracks_url(
            offset,
            &[("ordering", "popularity_total"), ("boost", "popularity_month")],
        )?;
        let result = self.fetch(url).await;
        log_api_result!("recommendations", result);
        result
    }

    /// Search when `query` is non-empty, recommendations otherwise
    pub async fn tracks(&self, query: &str, offset: usize) -> Result<CatalogPage, CatalogError> {
        if query.trim().is_empty() {
            self.recommendations(offset).await
        } else {
            self.search(query.trim(), offset).await
        }
    }

    fn tracks_url(&self, offset: usize, extra: &[(&str, &str)]) -> Result<Url, CatalogError> {
        let limit = PAGE_SIZE.to_string();
        let offset = offset.to_string();
        let mut params: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("format", "json"),
            ("limit", limit.as_str()),
            ("offset", offset.as_str()),
        ];
        params.extend_from_slice(extra);
        Ok(Url::parse_with_params(&format!("{}/tracks/", self.base_url), &params)?)
    }

    async fn fetch(&self, url: Url) -> Result<CatalogPage, CatalogError> {
        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(CatalogError::Status(response.status()));
        }
        let body: TracksResponse = response.json().await?;
        Ok(body.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> CatalogClient {
        CatalogClient::new("https://api.jamendo.com/v3.0/", "abc123").unwrap()
    }

    fn query_pairs(url: &Url) -> Vec<(String, String)> {
        url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect()
    }

    #[test]
    fn search_url_carries_paging_and_query() {
        let url = client()
            .tracks_url(40, &[("search", "lo fi & chill"), ("groupby", "artist_id")])
            .unwrap();
        assert_eq!(url.path(), "/v3.0/tracks/");
        let pairs = query_pairs(&url);
        assert!(pairs.contains(&("client_id".into(), "abc123".into())));
        assert!(pairs.contains(&("limit".into(), "20".into())));
        assert!(pairs.contains(&("offset".into(), "40".into())));
        assert!(pairs.contains(&("search".into(), "lo fi & chill".into())));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        assert!(matches!(
            CatalogClient::new("not a url", "id"),
            Err(CatalogError::Url(_))
        ));
    }

    #[test]
    fn response_maps_to_page() {
        let body = r#"{
            "headers": {"status": "success", "results_count": 57},
            "results": [
                {"id": "1532771", "name": "Sunrise", "artist_name": "Band", "image": "https://img/1.jpg", "audio": "https://audio/1.mp3"},
                {"id": "42", "name": "No Cover", "artist_name": "Solo", "image": "", "audio": "https://audio/42.mp3"}
            ]
        }"#;
        let response: TracksResponse = serde_json::from_str(body).unwrap();
        let page = CatalogPage::from(response);

        assert_eq!(page.total, 57);
        assert_eq!(page.tracks.len(), 2);
        assert_eq!(page.tracks[0].title, "Sunrise");
        assert_eq!(page.tracks[0].cover_url.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(page.tracks[1].cover_url, None);

        let song = page.tracks[1].to_song();
        assert_eq!(song.id, ItemId::Text("42".into()));
        assert_eq!(song.url, "https://audio/42.mp3");
    }
}
