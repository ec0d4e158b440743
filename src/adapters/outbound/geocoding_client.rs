//! Geocoding Client
//!
//! Implements PlaceSearch using the forward geocoding endpoint
//! (`/geocoding/{query}.json`). Geocoding features already carry a
//! position, so every suggestion it returns is resolved and there is
//! nothing left to retrieve.

use crate::domain::entities::{LocationSuggestion, ResolvedLocation, SourceRef};
use crate::domain::errors::SearchError;
use crate::domain::ports::PlaceSearch;
use crate::domain::value_objects::{Coordinates, FeatureType, Resolution, SessionToken};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<GeocodeFeature>,
}

#[derive(Debug, Deserialize)]
struct GeocodeFeature {
    id: String,
    text: String,
    #[serde(default)]
    place_name: Option<String>,
    #[serde(default)]
    place_type: Vec<String>,
    #[serde(default)]
    center: Option<[f64; 2]>,
    #[serde(default)]
    geometry: Option<GeocodeGeometry>,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    coordinates: Vec<f64>,
}

/// Configuration for the geocoding API.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    /// Base URL (e.g., "https://api.mapbox.com")
    pub base_url: String,
    /// Provider access token
    pub access_token: String,
    /// ISO 3166-1 alpha-2 country filter
    pub country: Option<String>,
    /// Feature types to search (e.g., "place,locality")
    pub types: Option<String>,
    /// Bias results toward this point
    pub proximity: Option<Coordinates>,
    /// Maximum results per call
    pub limit: usize,
    /// Client-side timeout per request
    pub timeout: Duration,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
            country: Some("ma".to_string()),
            types: Some("place,locality,neighborhood,poi,address".to_string()),
            proximity: None,
            limit: 5,
            timeout: Duration::from_millis(4000),
        }
    }
}

/// Forward geocoding client.
pub struct GeocodingClient {
    config: GeocodingConfig,
    client: reqwest::Client,
}

impl GeocodingClient {
    pub fn new(config: GeocodingConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Build the request URL, percent-encoding the query as a path segment.
    fn url(&self, query: &str) -> Result<Url, SearchError> {
        let base = format!("{}/geocoding", self.config.base_url.trim_end_matches('/'));
        let mut url = Url::parse(&base).map_err(|e| SearchError::Network(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SearchError::Network(format!("cannot-be-a-base url: {}", base)))?
            .push(&format!("{}.json", query));
        Ok(url)
    }

    /// Forward-geocode a free-text query.
    pub async fn geocode(&self, query: &str) -> Result<Vec<LocationSuggestion>, SearchError> {
        let mut params = vec![
            ("limit", self.config.limit.to_string()),
            ("access_token", self.config.access_token.clone()),
        ];
        if let Some(country) = &self.config.country {
            params.push(("country", country.clone()));
        }
        if let Some(types) = &self.config.types {
            params.push(("types", types.clone()));
        }
        if let Some(proximity) = &self.config.proximity {
            params.push(("proximity", proximity.to_pair()));
        }

        let response = self
            .client
            .get(self.url(query)?)
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let decoded: GeocodeResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))?;

        let suggestions: Vec<LocationSuggestion> = decoded
            .features
            .into_iter()
            .filter_map(normalize_feature)
            .collect();

        tracing::debug!("geocode {:?} -> {} features", query, suggestions.len());
        Ok(suggestions)
    }
}

/// Normalize one geocoding feature. Features without a usable position
/// are dropped.
fn normalize_feature(feature: GeocodeFeature) -> Option<LocationSuggestion> {
    let position = feature
        .center
        .map(|[lng, lat]| Coordinates::new(lng, lat))
        .or_else(|| match feature.geometry.as_ref()?.coordinates.as_slice() {
            [lng, lat, ..] => Some(Coordinates::new(*lng, *lat)),
            _ => None,
        });

    let resolution = Resolution::from_provider(position);
    if !resolution.is_resolved() {
        return None;
    }

    let feature_type = feature
        .place_type
        .first()
        .map(|t| FeatureType::from_provider(t))
        .unwrap_or(FeatureType::Place);

    // place_name repeats the text as its first component
    let place_formatted = feature
        .place_name
        .as_deref()
        .map(|full| {
            full.strip_prefix(feature.text.as_str())
                .map(|rest| rest.trim_start_matches(',').trim())
                .unwrap_or(full)
                .to_string()
        })
        .unwrap_or_default();

    Some(LocationSuggestion {
        id: feature.id.clone(),
        name: feature.text,
        place_formatted,
        feature_type,
        resolution,
        source_ref: SourceRef::Geocoding {
            feature_id: feature.id,
        },
    })
}

#[async_trait]
impl PlaceSearch for GeocodingClient {
    async fn suggest(
        &self,
        query: &str,
        _session: &SessionToken,
    ) -> Result<Vec<LocationSuggestion>, SearchError> {
        self.geocode(query).await
    }

    async fn retrieve(
        &self,
        source: &SourceRef,
        _session: &SessionToken,
    ) -> Result<ResolvedLocation, SearchError> {
        // Suggestions from this client are resolved at suggest time
        match source {
            SourceRef::Geocoding { feature_id } => {
                tracing::debug!("geocoding feature {} has no retrieve step", feature_id);
                Err(SearchError::Unresolved(feature_id.clone()))
            }
            other => Err(SearchError::Unresolved(format!("{:?}", other))),
        }
    }
}
