//! Google Places API client (https://maps.googleapis.com by default).

use super::{NearbyQuery, NearbySearch, Place};
use async_trait::async_trait;
use serde::Deserialize;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    #[error("places request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("places api error: {status} {}", .message.as_deref().unwrap_or(""))]
    Api {
        status: String,
        message: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<Place>,
    #[serde(default)]
    error_message: Option<String>,
}

/// Client for the Places nearby-search endpoint.
#[derive(Clone)]
pub struct GooglePlacesClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GooglePlacesClient {
    pub fn new(api_key: impl Into<String>, base_url: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    /// GET /maps/api/place/nearbysearch/json. ZERO_RESULTS is an empty list, not an error.
    pub async fn nearby_search(&self, query: &NearbyQuery) -> Result<Vec<Place>, PlacesError> {
        let url = format!("{}/maps/api/place/nearbysearch/json", self.base_url);
        let mut params = query.params();
        params.push(("key", self.api_key.clone()));
        let res = self.client.get(&url).query(&params).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(PlacesError::Api {
                status: status.to_string(),
                message: Some(body).filter(|b| !b.is_empty()),
            });
        }
        let data: NearbySearchResponse = res.json().await?;
        match data.status.as_str() {
            "OK" => Ok(data.results),
            "ZERO_RESULTS" => Ok(Vec::new()),
            _ => Err(PlacesError::Api {
                status: data.status,
                message: data.error_message,
            }),
        }
    }
}

#[async_trait]
impl NearbySearch for GooglePlacesClient {
    async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<Place>, PlacesError> {
        self.nearby_search(query).await
    }
}

impl std::fmt::Debug for GooglePlacesClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GooglePlacesClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}
