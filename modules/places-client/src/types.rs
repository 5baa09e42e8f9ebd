use serde::{Deserialize, Serialize};

/// Envelope of the nearby-search endpoint. `status` is an upstream token
/// (`OK`, `ZERO_RESULTS`, or an error code), not an HTTP status.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<Place>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// One place record as returned upstream. Everything beyond the identifier
/// and name is optional; unknown fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Place {
    pub place_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_ratings_total: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vicinity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formatted_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Geometry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<Photo>,
}

impl Place {
    /// Review count used for ranking; absent counts rank as zero.
    pub fn review_count(&self) -> u32 {
        self.user_ratings_total.unwrap_or(0)
    }

    /// Geographic location, when the record carries one.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.geometry
            .as_ref()
            .map(|g| (g.location.lat, g.location.lng))
    }

    /// Best available address text.
    pub fn address(&self) -> Option<&str> {
        self.vicinity
            .as_deref()
            .or(self.formatted_address.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    pub photo_reference: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}
