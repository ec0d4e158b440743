//! Fallback Place Search
//!
//! Composes two PlaceSearch implementations: the primary is asked first,
//! the fallback only when the primary fails or finds nothing.

use crate::domain::entities::{LocationSuggestion, ResolvedLocation, SourceRef};
use crate::domain::errors::SearchError;
use crate::domain::ports::PlaceSearch;
use crate::domain::value_objects::SessionToken;
use async_trait::async_trait;
use std::sync::Arc;

/// Primary-then-fallback place search.
pub struct FallbackPlaceSearch {
    primary: Arc<dyn PlaceSearch>,
    fallback: Arc<dyn PlaceSearch>,
}

impl FallbackPlaceSearch {
    pub fn new(primary: Arc<dyn PlaceSearch>, fallback: Arc<dyn PlaceSearch>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl PlaceSearch for FallbackPlaceSearch {
    async fn suggest(
        &self,
        query: &str,
        session: &SessionToken,
    ) -> Result<Vec<LocationSuggestion>, SearchError> {
        match self.primary.suggest(query, session).await {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(_) => tracing::debug!("primary search empty for {:?}, trying fallback", query),
            Err(e) if e.is_network() => {
                tracing::warn!("primary search failed for {:?}: {}, trying fallback", query, e)
            }
            Err(e) => return Err(e),
        }

        self.fallback.suggest(query, session).await
    }

    async fn retrieve(
        &self,
        source: &SourceRef,
        session: &SessionToken,
    ) -> Result<ResolvedLocation, SearchError> {
        match self.primary.retrieve(source, session).await {
            Err(SearchError::Unresolved(_)) => self.fallback.retrieve(source, session).await,
            other => other,
        }
    }
}
