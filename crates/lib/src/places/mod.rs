//! Nearby place search.
//!
//! The router asks for places through [`NearbySearch`]; [`GooglePlacesClient`]
//! implements it against the Google Places nearby-search endpoint.

mod google;

pub use google::{GooglePlacesClient, PlacesError};

use async_trait::async_trait;
use serde::Deserialize;

/// WGS-84 point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Nearby search request, always ranked by distance. Distance ranking forbids a
/// radius, so the query has no radius to send.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub location: LatLng,
    pub place_type: String,
    pub language: String,
    pub open_now: bool,
}

impl NearbyQuery {
    /// Open places of `place_type` nearest to `location`.
    pub fn open_nearest(location: LatLng, place_type: &str, language: &str) -> Self {
        Self {
            location,
            place_type: place_type.to_string(),
            language: language.to_string(),
            open_now: true,
        }
    }

    /// Query-string parameters, without the API key.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            (
                "location",
                format!("{},{}", self.location.lat, self.location.lng),
            ),
            ("rankby", "distance".to_string()),
        ];
        if !self.place_type.is_empty() {
            params.push(("type", self.place_type.clone()));
        }
        if !self.language.is_empty() {
            params.push(("language", self.language.clone()));
        }
        if self.open_now {
            params.push(("opennow", "true".to_string()));
        }
        params
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Place {
    pub name: String,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub vicinity: String,
    /// Unrated places come back without a rating; treated as 0.
    #[serde(default)]
    pub rating: f64,
}

#[async_trait]
pub trait NearbySearch: Send + Sync {
    /// Places matching the query, in the order the service ranked them.
    async fn nearby(&self, query: &NearbyQuery) -> Result<Vec<Place>, PlacesError>;
}
