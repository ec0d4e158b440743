//! In-Memory Recent Searches
//!
//! Implements RecentSearchStore without persistence. Used when no
//! database path is configured.

use crate::domain::entities::{RecentSearch, ResolvedLocation};
use crate::domain::errors::SearchError;
use crate::domain::ports::{RecentSearchStore, MAX_RECENT_SEARCHES};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;

/// Recent searches kept for the lifetime of the process.
#[derive(Default)]
pub struct MemoryRecentSearches {
    entries: Mutex<VecDeque<RecentSearch>>,
}

impl MemoryRecentSearches {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecentSearchStore for MemoryRecentSearches {
    async fn record(&self, location: &ResolvedLocation) -> Result<(), SearchError> {
        let mut entries = self.entries.lock();
        entries.retain(|e| e.id != location.id);
        entries.push_front(RecentSearch::new(location));
        entries.truncate(MAX_RECENT_SEARCHES);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<RecentSearch>, SearchError> {
        Ok(self.entries.lock().iter().cloned().collect())
    }

    async fn clear(&self) -> Result<(), SearchError> {
        self.entries.lock().clear();
        Ok(())
    }
}
