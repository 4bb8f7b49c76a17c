//! HTTP client for the recommendation service

use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use vibe_common::api::{HealthStatus, RecommendRequest, RecommendResponse, Track};
use vibe_common::config::TomlConfig;
use vibe_common::{Error, Result};

/// FastAPI error body
#[derive(Deserialize)]
struct ErrorBody {
    detail: Value,
}

pub struct RecommendationClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RecommendationClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid api_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("api_url '{}' cannot be a base URL", base_url)));
        }
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base_url })
    }

    pub fn from_config(config: &TomlConfig) -> Result<Self> {
        Self::new(&config.api_url, config.request_timeout())
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let response = self.http.get(self.endpoint(&["health"])).send().await?;
        decode(response).await
    }

    /// Artist names matching `query`, for seed picking
    pub async fn search_artists(&self, query: &str, limit: u32) -> Result<Vec<String>> {
        let response = self
            .http
            .get(self.endpoint(&["artists"]))
            .query(&[("q", query.to_string()), ("limit", limit.to_string())])
            .send()
            .await?;
        decode(response).await
    }

    /// Full track list of one artist
    pub async fn artist_tracks(&self, artist: &str) -> Result<Vec<Track>> {
        let response = self
            .http
            .get(self.endpoint(&["artists", artist, "tracks"]))
            .send()
            .await?;
        decode(response).await
    }

    pub async fn recommend(&self, request: &RecommendRequest) -> Result<RecommendResponse> {
        debug!(
            "POST /recommend: {} artist(s), {} excluded",
            request.artists.len(),
            request.excluded_count()
        );
        let response = self
            .http
            .post(self.endpoint(&["recommend"]))
            .json(request)
            .send()
            .await?;
        decode(response).await
    }

    /// Base URL plus percent-encoded path segments
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        let body = response.bytes().await?;
        return Ok(serde_json::from_slice(&body)?);
    }

    let body = response.text().await.unwrap_or_default();
    debug!("Service returned {}: {}", status, body);
    Err(Error::Status {
        status: status.as_u16(),
        detail: error_detail(&body),
    })
}

/// Human-readable part of an error body
///
/// `detail` is a string for raised errors and a list of field errors for
/// request validation failures.
fn error_detail(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) else {
        return String::new();
    };
    match parsed.detail {
        Value::String(detail) => detail,
        Value::Array(items) => items
            .iter()
            .filter_map(|item| item.get("msg").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_encodes_artist_names() {
        let client = RecommendationClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();

        let url = client.endpoint(&["artists", "AC/DC Live", "tracks"]);

        assert_eq!(url.as_str(), "http://localhost:8000/artists/AC%2FDC%20Live/tracks");
    }

    #[test]
    fn test_endpoint_keeps_base_path_prefix() {
        let client = RecommendationClient::new("http://host/api", Duration::from_secs(1)).unwrap();

        assert_eq!(client.endpoint(&["health"]).as_str(), "http://host/api/health");
    }

    #[test]
    fn test_invalid_base_url_is_config_error() {
        let result = RecommendationClient::new("not a url", Duration::from_secs(1));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_error_detail_variants() {
        assert_eq!(error_detail(r#"{"detail":"Artist not found"}"#), "Artist not found");
        assert_eq!(
            error_detail(r#"{"detail":[{"loc":["body","artists"],"msg":"field required"}]}"#),
            "field required"
        );
        assert_eq!(error_detail("<html>oops</html>"), "");
    }
}
