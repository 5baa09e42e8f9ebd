use serde::{Deserialize, Serialize};

// --- Geo Types ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// The host map's currently displayed center and zoom, inferred from its URL.
/// Replaced atomically on every observation; never partially updated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapViewState {
    pub center: GeoPoint,
    pub zoom: f64,
}

/// A pixel position inside the host viewport. Origin is the top-left corner;
/// y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

// --- Search Categories ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceCategory {
    Restaurants,
    Hotels,
    Attractions,
}

impl PlaceCategory {
    pub const ALL: [PlaceCategory; 3] = [
        PlaceCategory::Restaurants,
        PlaceCategory::Hotels,
        PlaceCategory::Attractions,
    ];

    /// Upstream place-type tokens queried for this category. One query is
    /// dispatched per token.
    pub fn subtypes(&self) -> &'static [&'static str] {
        match self {
            PlaceCategory::Restaurants => {
                &["restaurant", "food", "meal_takeaway", "cafe", "bakery", "bar"]
            }
            PlaceCategory::Hotels => &["lodging"],
            PlaceCategory::Attractions => &[
                "tourist_attraction",
                "amusement_park",
                "aquarium",
                "art_gallery",
                "museum",
                "park",
                "zoo",
            ],
        }
    }
}

impl std::fmt::Display for PlaceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceCategory::Restaurants => write!(f, "restaurants"),
            PlaceCategory::Hotels => write!(f, "hotels"),
            PlaceCategory::Attractions => write!(f, "attractions"),
        }
    }
}

/// Category toggles supplied by the control surface. A search may only run
/// when at least one flag is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilters {
    pub restaurants: bool,
    pub hotels: bool,
    pub attractions: bool,
}

impl SearchFilters {
    pub fn all() -> Self {
        Self {
            restaurants: true,
            hotels: true,
            attractions: true,
        }
    }

    pub fn any(&self) -> bool {
        self.restaurants || self.hotels || self.attractions
    }

    fn enabled(&self, category: PlaceCategory) -> bool {
        match category {
            PlaceCategory::Restaurants => self.restaurants,
            PlaceCategory::Hotels => self.hotels,
            PlaceCategory::Attractions => self.attractions,
        }
    }

    /// Expand the enabled categories into the flat list of upstream subtype
    /// tokens, in fixed category order. The order is load-bearing: the query
    /// fan-out dispatches in this order and duplicate merges resolve by it.
    pub fn subtypes(&self) -> Vec<&'static str> {
        PlaceCategory::ALL
            .iter()
            .filter(|c| self.enabled(**c))
            .flat_map(|c| c.subtypes().iter().copied())
            .collect()
    }
}
