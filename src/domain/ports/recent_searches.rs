//! Recent Searches Port
//!
//! Defines the interface for the persisted list of recently picked places.

use crate::domain::entities::{RecentSearch, ResolvedLocation};
use crate::domain::errors::SearchError;
use async_trait::async_trait;

/// Maximum number of recent searches kept.
pub const MAX_RECENT_SEARCHES: usize = 5;

/// Store for recent searches.
///
/// The list is most-recent-first, deduplicated by suggestion id and
/// capped at [`MAX_RECENT_SEARCHES`].
#[async_trait]
pub trait RecentSearchStore: Send + Sync {
    /// Record a picked location, moving it to the front if already present.
    async fn record(&self, location: &ResolvedLocation) -> Result<(), SearchError>;

    /// Get the list, most recent first.
    async fn list(&self) -> Result<Vec<RecentSearch>, SearchError>;

    /// Remove every entry.
    async fn clear(&self) -> Result<(), SearchError>;
}
