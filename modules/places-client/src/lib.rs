pub mod error;
pub mod types;

pub use error::{PlacesError, Result};
pub use types::{Geometry, LatLng, NearbyResponse, Photo, Place};

use std::time::Duration;

const BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Host-page deep link for one place. Opening it focuses the place on the
/// map page itself, so pins can link back without any further API call.
pub fn place_page_url(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{place_id}")
}

pub struct PlacesClient {
    client: reqwest::Client,
    base_url: String,
}

impl PlacesClient {
    pub fn new() -> Self {
        Self::with_base_url(BASE_URL)
    }

    /// Point the client at a different endpoint root (test servers).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: base_url.into(),
        }
    }

    /// Search for places near a point. `place_type` scopes the search to one
    /// upstream type token; `None` searches untyped. `ZERO_RESULTS` is an
    /// empty list, not an error.
    pub async fn nearby_search(
        &self,
        lat: f64,
        lng: f64,
        radius_m: u32,
        place_type: Option<&str>,
        api_key: &str,
    ) -> Result<Vec<Place>> {
        let mut url = format!(
            "{}/nearbysearch/json?location={lat},{lng}&radius={radius_m}&key={api_key}",
            self.base_url
        );
        if let Some(t) = place_type {
            url.push_str(&format!("&type={t}"));
        }

        tracing::debug!(place_type = place_type.unwrap_or("all"), radius_m, "Nearby search");
        let resp = self.client.get(&url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PlacesError::Api {
                status: format!("HTTP {}", status.as_u16()),
                message: body,
            });
        }

        let body: NearbyResponse = resp.json().await?;
        match body.status.as_str() {
            "OK" => {
                tracing::debug!(count = body.results.len(), "Nearby search returned results");
                Ok(body.results)
            }
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(PlacesError::Api {
                status: other.to_string(),
                message: body.error_message.unwrap_or_default(),
            }),
        }
    }

    /// Build the URL of a photo referenced by a search result, used for
    /// result-list thumbnails.
    pub fn photo_url(&self, photo_reference: &str, max_width: u32, api_key: &str) -> String {
        format!(
            "{}/photo?maxwidth={max_width}&photo_reference={photo_reference}&key={api_key}",
            self.base_url
        )
    }
}

impl Default for PlacesClient {
    fn default() -> Self {
        Self::new()
    }
}
