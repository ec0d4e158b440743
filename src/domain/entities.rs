//! Domain Entities - Core business objects
//!
//! These entities represent the places a user can search for and pick.
//! They have no external dependencies beyond serde.

use crate::domain::value_objects::{Coordinates, FeatureType, Resolution};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A city known to the catalog or the backend city API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CityRecord {
    pub id: String,
    pub name: String,
    pub coordinates: Coordinates,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub population: Option<u64>,
}

/// Where a suggestion came from.
///
/// Only used to route a retrieve call back to the right source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SourceRef {
    Catalog { city_id: String },
    Backend { city_id: String },
    SearchBox { mapbox_id: String },
    Geocoding { feature_id: String },
}

/// A candidate place returned by search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSuggestion {
    pub id: String,
    pub name: String,
    pub place_formatted: String,
    pub feature_type: FeatureType,
    pub resolution: Resolution,
    pub source_ref: SourceRef,
}

impl LocationSuggestion {
    /// Build a resolved suggestion from a catalog city.
    pub fn from_catalog(city: &CityRecord) -> Self {
        Self::from_city(
            city,
            SourceRef::Catalog {
                city_id: city.id.clone(),
            },
        )
    }

    /// Build a resolved suggestion from a backend city record.
    pub fn from_backend(city: &CityRecord) -> Self {
        Self::from_city(
            city,
            SourceRef::Backend {
                city_id: city.id.clone(),
            },
        )
    }

    fn from_city(city: &CityRecord, source_ref: SourceRef) -> Self {
        Self {
            id: city.id.clone(),
            name: city.name.clone(),
            place_formatted: city.region.clone().unwrap_or_default(),
            feature_type: FeatureType::Place,
            resolution: Resolution::from_provider(Some(city.coordinates)),
            source_ref,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolution.is_resolved()
    }

    /// Convert into a location usable by the map. Returns `None` while the
    /// suggestion still needs a retrieve call.
    pub fn to_resolved(&self) -> Option<ResolvedLocation> {
        let coordinates = self.resolution.coordinates()?;
        Some(ResolvedLocation {
            id: self.id.clone(),
            name: self.name.clone(),
            place_formatted: self.place_formatted.clone(),
            coordinates,
        })
    }
}

/// A place with real coordinates. This is the only shape the marker binder
/// and the viewport accept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub id: String,
    pub name: String,
    pub place_formatted: String,
    pub coordinates: Coordinates,
}

impl ResolvedLocation {
    /// Slug used as the selection value: `"Casablanca"` -> `"casablanca"`.
    pub fn slug(&self) -> String {
        slugify(&self.name)
    }
}

/// Display metadata stored alongside the selected value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionData {
    pub label: String,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub place_formatted: Option<String>,
}

impl SelectionData {
    pub fn labelled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            coordinates: None,
            place_formatted: None,
        }
    }
}

/// The single active selection held by a selection store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedLocation {
    pub value: String,
    pub data: SelectionData,
}

impl From<&ResolvedLocation> for SelectedLocation {
    fn from(location: &ResolvedLocation) -> Self {
        Self {
            value: location.slug(),
            data: SelectionData {
                label: location.name.clone(),
                coordinates: Some(location.coordinates),
                place_formatted: (!location.place_formatted.is_empty())
                    .then(|| location.place_formatted.clone()),
            },
        }
    }
}

/// An entry of the recent searches list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub id: String,
    pub name: String,
    pub place_formatted: String,
    pub coordinates: Coordinates,
    pub searched_at: DateTime<Utc>,
}

impl RecentSearch {
    pub fn new(location: &ResolvedLocation) -> Self {
        Self {
            id: location.id.clone(),
            name: location.name.clone(),
            place_formatted: location.place_formatted.clone(),
            coordinates: location.coordinates,
            searched_at: Utc::now(),
        }
    }
}

fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}
