//! HTTP City Repository
//!
//! Implements CityRepository against the backend's `/cities` endpoints.
//! The full list is cached in memory until the configured TTL expires.

use crate::domain::entities::CityRecord;
use crate::domain::errors::SearchError;
use crate::domain::ports::CityRepository;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// One page of the `/cities` listing.
#[derive(Debug, Deserialize)]
struct CityPage {
    data: Vec<CityRecord>,
    #[serde(rename = "hasNextPage", default)]
    has_next_page: bool,
}

/// Configuration for the backend city API.
#[derive(Debug, Clone)]
pub struct CityApiConfig {
    /// Base URL of the backend (e.g., "https://api.example.com")
    pub base_url: String,
    /// How long a fetched city list stays fresh
    pub cache_ttl: Duration,
    /// Upper bound on pages followed for one listing
    pub max_pages: u32,
    /// Client-side timeout per request
    pub timeout: Duration,
}

impl Default for CityApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            cache_ttl: Duration::from_secs(3600),
            max_pages: 20,
            timeout: Duration::from_millis(4000),
        }
    }
}

struct CachedCities {
    fetched_at: Instant,
    cities: Vec<CityRecord>,
}

/// Backend-of-record city repository.
pub struct HttpCityRepository {
    config: CityApiConfig,
    client: reqwest::Client,
    cache: Arc<RwLock<Option<CachedCities>>>,
    fetch_count: Arc<AtomicU64>,
}

impl HttpCityRepository {
    /// Create a repository with its own HTTP client.
    pub fn new(config: CityApiConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self::with_client(config, client))
    }

    /// Create a repository sharing an existing HTTP client.
    pub fn with_client(config: CityApiConfig, client: reqwest::Client) -> Self {
        Self {
            config,
            client,
            cache: Arc::new(RwLock::new(None)),
            fetch_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Number of full listings fetched from the backend so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetch_count.load(Ordering::SeqCst)
    }

    /// Drop the cached listing so the next call re-fetches.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    async fn fetch_page(&self, page: u32) -> Result<CityPage, SearchError> {
        let url = format!("{}/cities", self.config.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn fetch_all(&self) -> Result<Vec<CityRecord>, SearchError> {
        let mut cities = Vec::new();
        let mut page = 1;

        loop {
            let batch = self.fetch_page(page).await?;
            cities.extend(batch.data);

            if !batch.has_next_page {
                break;
            }
            if page >= self.config.max_pages {
                tracing::warn!(
                    "city listing truncated after {} pages ({} cities)",
                    page,
                    cities.len()
                );
                break;
            }
            page += 1;
        }

        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        tracing::info!("fetched {} cities in {} page(s)", cities.len(), page);

        Ok(cities)
    }

    async fn decode(response: reqwest::Response) -> Result<CityPage, SearchError> {
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

#[async_trait]
impl CityRepository for HttpCityRepository {
    async fn list_cities(&self) -> Result<Vec<CityRecord>, SearchError> {
        {
            let guard = self.cache.read().await;
            if let Some(cached) = guard.as_ref() {
                if cached.fetched_at.elapsed() < self.config.cache_ttl {
                    return Ok(cached.cities.clone());
                }
            }
        }

        let cities = self.fetch_all().await?;
        *self.cache.write().await = Some(CachedCities {
            fetched_at: Instant::now(),
            cities: cities.clone(),
        });

        Ok(cities)
    }

    async fn search_cities(&self, name: &str) -> Result<Vec<CityRecord>, SearchError> {
        let url = format!(
            "{}/cities/search",
            self.config.base_url.trim_end_matches('/')
        );
        let response = self
            .client
            .get(&url)
            .query(&[("name", name)])
            .send()
            .await?;

        let page = Self::decode(response).await?;
        tracing::debug!("backend city search {:?} -> {} hits", name, page.data.len());

        Ok(page.data)
    }
}
