//! Value Objects - Immutable domain primitives
//!
//! Value objects are identified by their value rather than identity.
//! They are immutable and can be freely shared.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic position in WGS84 degrees.
///
/// Providers send positions as `[longitude, latitude]`, so longitude
/// comes first here as well.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinates {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Parse a `"lng,lat"` pair as used by the `proximity` query parameter.
    pub fn parse_pair(s: &str) -> Option<Self> {
        let (lng, lat) = s.split_once(',')?;
        let coords = Self::new(lng.trim().parse().ok()?, lat.trim().parse().ok()?);
        coords.is_valid().then_some(coords)
    }

    /// The `(0,0)` value providers use for "needs a retrieve call".
    pub fn is_placeholder(&self) -> bool {
        self.longitude == 0.0 && self.latitude == 0.0
    }

    pub fn is_valid(&self) -> bool {
        self.longitude.is_finite()
            && self.latitude.is_finite()
            && (-180.0..=180.0).contains(&self.longitude)
            && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Great-circle distance in kilometres (haversine).
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        let lat1 = self.latitude.to_radians();
        let lat2 = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lng = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Format as `"lng,lat"`.
    pub fn to_pair(&self) -> String {
        format!("{},{}", self.longitude, self.latitude)
    }
}

/// Whether a suggestion carries usable coordinates.
///
/// Suggestions from the search box arrive without a position and must go
/// through a retrieve call before they can drive the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    Unresolved,
    Resolved(Coordinates),
}

impl Resolution {
    /// Map provider coordinates, treating a missing or `(0,0)` position
    /// as unresolved.
    pub fn from_provider(coords: Option<Coordinates>) -> Self {
        match coords {
            Some(c) if !c.is_placeholder() && c.is_valid() => Self::Resolved(c),
            _ => Self::Unresolved,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Self::Resolved(c) => Some(*c),
            Self::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Kind of place a suggestion refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureType {
    Address,
    Poi,
    Place,
    Locality,
    Neighborhood,
}

impl FeatureType {
    /// Parse a provider feature type. Unknown kinds fall back to `Place`.
    pub fn from_provider(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "address" | "street" => Self::Address,
            "poi" | "category" => Self::Poi,
            "locality" => Self::Locality,
            "neighborhood" => Self::Neighborhood,
            _ => Self::Place,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Address => "address",
            Self::Poi => "poi",
            Self::Place => "place",
            Self::Locality => "locality",
            Self::Neighborhood => "neighborhood",
        }
    }

    /// Ranking tier for remote suggestions (lower sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            Self::Place => 0,
            Self::Locality => 1,
            Self::Neighborhood => 2,
            Self::Poi => 3,
            Self::Address => 4,
        }
    }
}

impl std::fmt::Display for FeatureType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Token grouping the suggest/retrieve calls of one search session so the
/// provider can bill them together.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
