//! Place Search Port
//!
//! Defines the interface for free-text place suggestions from a remote
//! search or geocoding provider.

use crate::domain::entities::{LocationSuggestion, ResolvedLocation, SourceRef};
use crate::domain::errors::SearchError;
use crate::domain::value_objects::SessionToken;
use async_trait::async_trait;

/// Remote place search.
///
/// `suggest` may return unresolved suggestions; `retrieve` turns one of
/// them into a location with real coordinates. Both calls of one user
/// session carry the same session token.
#[async_trait]
pub trait PlaceSearch: Send + Sync {
    /// Get suggestions for a free-text query.
    async fn suggest(
        &self,
        query: &str,
        session: &SessionToken,
    ) -> Result<Vec<LocationSuggestion>, SearchError>;

    /// Resolve a suggestion issued by `suggest` into real coordinates.
    async fn retrieve(
        &self,
        source: &SourceRef,
        session: &SessionToken,
    ) -> Result<ResolvedLocation, SearchError>;
}
