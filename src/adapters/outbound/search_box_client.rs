//! Search Box Client
//!
//! Implements PlaceSearch using the provider's interactive search API:
//! `/search/suggest` for unresolved suggestions and `/search/retrieve/{id}`
//! to obtain coordinates.

use crate::domain::entities::{LocationSuggestion, ResolvedLocation, SourceRef};
use crate::domain::errors::SearchError;
use crate::domain::ports::PlaceSearch;
use crate::domain::value_objects::{Coordinates, FeatureType, Resolution, SessionToken};
use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct SuggestResponse {
    #[serde(default)]
    suggestions: Vec<RawSuggestion>,
}

#[derive(Debug, Deserialize)]
struct RawSuggestion {
    mapbox_id: String,
    name: String,
    #[serde(default)]
    place_formatted: Option<String>,
    #[serde(default)]
    full_address: Option<String>,
    #[serde(default)]
    feature_type: Option<String>,
    #[serde(default)]
    coordinates: Option<RawCoordinates>,
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    longitude: f64,
    latitude: f64,
}

#[derive(Debug, Deserialize)]
struct RetrieveResponse {
    #[serde(default)]
    features: Vec<RetrievedFeature>,
}

#[derive(Debug, Deserialize)]
struct RetrievedFeature {
    geometry: Geometry,
    properties: FeatureProperties,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    coordinates: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct FeatureProperties {
    mapbox_id: String,
    name: String,
    #[serde(default)]
    place_formatted: Option<String>,
    #[serde(default)]
    full_address: Option<String>,
}

/// Configuration for the search box API.
#[derive(Debug, Clone)]
pub struct SearchBoxConfig {
    /// Base URL (e.g., "https://api.mapbox.com/search/searchbox/v1")
    pub base_url: String,
    /// Provider access token
    pub access_token: String,
    /// ISO 3166-1 alpha-2 country filter
    pub country: Option<String>,
    /// Bias results toward this point
    pub proximity: Option<Coordinates>,
    /// Maximum suggestions per call
    pub limit: usize,
    /// Client-side timeout per request
    pub timeout: Duration,
}

impl Default for SearchBoxConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.mapbox.com/search/searchbox/v1".to_string(),
            access_token: String::new(),
            country: Some("ma".to_string()),
            proximity: None,
            limit: 5,
            timeout: Duration::from_millis(4000),
        }
    }
}

/// Search box client.
pub struct SearchBoxClient {
    config: SearchBoxConfig,
    client: reqwest::Client,
}

impl SearchBoxClient {
    pub fn new(config: SearchBoxConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    /// Append path segments to the base URL, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Result<Url, SearchError> {
        let base = self.config.base_url.trim_end_matches('/');
        let mut url = Url::parse(base).map_err(|e| SearchError::Network(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| SearchError::Network(format!("cannot-be-a-base url: {}", base)))?
            .extend(segments);
        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&str, String)],
    ) -> Result<T, SearchError> {
        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| SearchError::Decode(e.to_string()))
    }
}

/// Normalize one raw suggestion into the canonical type.
fn normalize_suggestion(raw: RawSuggestion) -> LocationSuggestion {
    let coords = raw
        .coordinates
        .map(|c| Coordinates::new(c.longitude, c.latitude));

    LocationSuggestion {
        id: raw.mapbox_id.clone(),
        place_formatted: raw
            .place_formatted
            .or(raw.full_address)
            .unwrap_or_default(),
        name: raw.name,
        feature_type: FeatureType::from_provider(raw.feature_type.as_deref().unwrap_or("")),
        resolution: Resolution::from_provider(coords),
        source_ref: SourceRef::SearchBox {
            mapbox_id: raw.mapbox_id,
        },
    }
}

/// Normalize a retrieved feature into a resolved location.
fn normalize_feature(feature: RetrievedFeature) -> Result<ResolvedLocation, SearchError> {
    let id = feature.properties.mapbox_id;
    let coords = match feature.geometry.coordinates.as_slice() {
        [lng, lat, ..] => Coordinates::new(*lng, *lat),
        _ => return Err(SearchError::Decode(format!("feature {} has no position", id))),
    };

    match Resolution::from_provider(Some(coords)) {
        Resolution::Resolved(coordinates) => Ok(ResolvedLocation {
            place_formatted: feature
                .properties
                .place_formatted
                .or(feature.properties.full_address)
                .unwrap_or_default(),
            id,
            name: feature.properties.name,
            coordinates,
        }),
        Resolution::Unresolved => Err(SearchError::Unresolved(id)),
    }
}

#[async_trait]
impl PlaceSearch for SearchBoxClient {
    async fn suggest(
        &self,
        query: &str,
        session: &SessionToken,
    ) -> Result<Vec<LocationSuggestion>, SearchError> {
        let mut params = vec![
            ("q", query.to_string()),
            ("session_token", session.to_string()),
            ("limit", self.config.limit.to_string()),
            ("access_token", self.config.access_token.clone()),
        ];
        if let Some(country) = &self.config.country {
            params.push(("country", country.clone()));
        }
        if let Some(proximity) = &self.config.proximity {
            params.push(("proximity", proximity.to_pair()));
        }

        let response: SuggestResponse = self.get(self.url(&["suggest"])?, &params).await?;
        tracing::debug!(
            "search box suggest {:?} -> {} suggestions",
            query,
            response.suggestions.len()
        );

        Ok(response
            .suggestions
            .into_iter()
            .map(normalize_suggestion)
            .collect())
    }

    async fn retrieve(
        &self,
        source: &SourceRef,
        session: &SessionToken,
    ) -> Result<ResolvedLocation, SearchError> {
        let mapbox_id = match source {
            SourceRef::SearchBox { mapbox_id } => mapbox_id,
            other => return Err(SearchError::Unresolved(format!("{:?}", other))),
        };

        let params = [
            ("session_token", session.to_string()),
            ("access_token", self.config.access_token.clone()),
        ];
        let url = self.url(&["retrieve", mapbox_id.as_str()])?;
        let response: RetrieveResponse = self.get(url, &params).await?;

        let feature = response
            .features
            .into_iter()
            .next()
            .ok_or(SearchError::NoResults)?;

        normalize_feature(feature)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> SearchBoxClient {
        SearchBoxClient::new(SearchBoxConfig {
            base_url: format!("{}/search", server.uri()),
            access_token: "pk.test".to_string(),
            country: Some("ma".to_string()),
            proximity: Some(Coordinates::new(-7.5898, 33.5731)),
            limit: 5,
            timeout: Duration::from_secs(2),
        })
        .unwrap()
    }

    // ===== Normalization Tests =====

    #[test]
    fn test_normalize_suggestion_without_coordinates() {
        let raw = RawSuggestion {
            mapbox_id: "dXJuOm1ieHBvaTo".to_string(),
            name: "Twin Center".to_string(),
            place_formatted: Some("Casablanca, Morocco".to_string()),
            full_address: None,
            feature_type: Some("poi".to_string()),
            coordinates: None,
        };

        let s = normalize_suggestion(raw);
        assert_eq!(s.id, "dXJuOm1ieHBvaTo");
        assert_eq!(s.place_formatted, "Casablanca, Morocco");
        assert_eq!(s.feature_type, FeatureType::Poi);
        assert!(!s.is_resolved());
    }

    #[test]
    fn test_normalize_suggestion_placeholder_is_unresolved() {
        let raw = RawSuggestion {
            mapbox_id: "id".to_string(),
            name: "Somewhere".to_string(),
            place_formatted: None,
            full_address: Some("1 Rue X".to_string()),
            feature_type: None,
            coordinates: Some(RawCoordinates {
                longitude: 0.0,
                latitude: 0.0,
            }),
        };

        let s = normalize_suggestion(raw);
        assert!(!s.is_resolved());
        assert_eq!(s.place_formatted, "1 Rue X");
        assert_eq!(s.feature_type, FeatureType::Place);
    }

    // ===== HTTP Tests =====

    #[tokio::test]
    async fn test_suggest_sends_session_and_filters() {
        let server = MockServer::start().await;
        let session = SessionToken::new();

        Mock::given(method("GET"))
            .and(path("/search/suggest"))
            .and(query_param("q", "casa"))
            .and(query_param("session_token", session.as_str()))
            .and(query_param("country", "ma"))
            .and(query_param("proximity", "-7.5898,33.5731"))
            .and(query_param("limit", "5"))
            .and(query_param("access_token", "pk.test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "suggestions": [
                    {
                        "mapbox_id": "a1",
                        "name": "Casablanca",
                        "place_formatted": "Casablanca-Settat, Morocco",
                        "feature_type": "place"
                    },
                    {
                        "mapbox_id": "a2",
                        "name": "Casa Port",
                        "place_formatted": "Casablanca, Morocco",
                        "feature_type": "poi"
                    }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let results = client(&server).suggest("casa", &session).await.unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].name, "Casablanca");
        assert_eq!(results[1].feature_type, FeatureType::Poi);
        assert!(results.iter().all(|s| !s.is_resolved()));
    }

    #[tokio::test]
    async fn test_suggest_empty_is_ok() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/suggest"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "suggestions": []
            })))
            .mount(&server)
            .await;

        let results = client(&server)
            .suggest("zzzz", &SessionToken::new())
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_suggest_non_2xx_is_network_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/suggest"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Not Authorized"))
            .mount(&server)
            .await;

        let err = client(&server)
            .suggest("casa", &SessionToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            SearchError::Status {
                status: 401,
                body: "Not Authorized".to_string()
            }
        );
        assert!(err.is_network());
    }

    #[tokio::test]
    async fn test_suggest_timeout() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/suggest"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "suggestions": [] }))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = SearchBoxClient::new(SearchBoxConfig {
            base_url: format!("{}/search", server.uri()),
            timeout: Duration::from_millis(50),
            ..SearchBoxConfig::default()
        })
        .unwrap();

        let err = client.suggest("casa", &SessionToken::new()).await.unwrap_err();
        assert_eq!(err, SearchError::Timeout);
    }

    #[tokio::test]
    async fn test_retrieve_resolves_coordinates() {
        let server = MockServer::start().await;
        let session = SessionToken::new();

        Mock::given(method("GET"))
            .and(path("/search/retrieve/a1"))
            .and(query_param("session_token", session.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "type": "FeatureCollection",
                "features": [{
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-7.5898, 33.5731] },
                    "properties": {
                        "mapbox_id": "a1",
                        "name": "Casablanca",
                        "place_formatted": "Casablanca-Settat, Morocco"
                    }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = SourceRef::SearchBox {
            mapbox_id: "a1".to_string(),
        };
        let resolved = client(&server).retrieve(&source, &session).await.unwrap();

        assert_eq!(resolved.id, "a1");
        assert_eq!(resolved.name, "Casablanca");
        assert_eq!(resolved.coordinates, Coordinates::new(-7.5898, 33.5731));
    }

    #[tokio::test]
    async fn test_retrieve_escapes_opaque_id() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/retrieve/a%2F..%2Fb%3Fx%23y"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": [{
                    "geometry": { "coordinates": [-6.8498, 34.0209] },
                    "properties": { "mapbox_id": "a/../b?x#y", "name": "Rabat" }
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let source = SourceRef::SearchBox {
            mapbox_id: "a/../b?x#y".to_string(),
        };
        let resolved = client(&server)
            .retrieve(&source, &SessionToken::new())
            .await
            .unwrap();
        assert_eq!(resolved.name, "Rabat");
    }

    #[tokio::test]
    async fn test_retrieve_empty_features_is_no_results() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/search/retrieve/gone"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "features": []
            })))
            .mount(&server)
            .await;

        let source = SourceRef::SearchBox {
            mapbox_id: "gone".to_string(),
        };
        let err = client(&server)
            .retrieve(&source, &SessionToken::new())
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::NoResults);
    }

    #[tokio::test]
    async fn test_retrieve_rejects_foreign_source() {
        let server = MockServer::start().await;
        let source = SourceRef::Geocoding {
            feature_id: "place.1".to_string(),
        };

        let err = client(&server)
            .retrieve(&source, &SessionToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Unresolved(_)));
    }
}
