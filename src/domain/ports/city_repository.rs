//! City Repository Port
//!
//! Defines the interface for the backend-of-record city API.

use crate::domain::entities::CityRecord;
use crate::domain::errors::SearchError;
use async_trait::async_trait;

/// Repository for city records served by the backend.
///
/// The full list is fetched once per session and treated as read-mostly;
/// implementations re-fetch it only after their cache expires.
#[async_trait]
pub trait CityRepository: Send + Sync {
    /// Get every city known to the backend.
    async fn list_cities(&self) -> Result<Vec<CityRecord>, SearchError>;

    /// Get the cities whose name matches, filtered server-side.
    async fn search_cities(&self, name: &str) -> Result<Vec<CityRecord>, SearchError>;
}
