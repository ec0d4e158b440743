//! Location Resolver - Main application use case
//!
//! Turns a free-text query into a ranked list of location suggestions by
//! combining the bundled catalog, the backend city list and the remote
//! place search. Also owns the retrieve-then-select flow.

use crate::domain::entities::{LocationSuggestion, RecentSearch, ResolvedLocation};
use crate::domain::errors::SearchError;
use crate::domain::ports::{CityCatalog, CityRepository, PlaceSearch, RecentSearchStore};
use crate::domain::services::{normalize_name, LocationMerger};
use crate::domain::value_objects::{Coordinates, SessionToken};
use crate::state::SelectionStore;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Resolver tuning.
#[derive(Debug, Clone)]
pub struct ResolverSettings {
    /// Maximum number of suggestions returned
    pub max_results: usize,
    /// Two same-name places closer than this are one place
    pub dedup_threshold_km: f64,
    /// Bias point for ranking remote suggestions
    pub proximity: Option<Coordinates>,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            max_results: 8,
            dedup_threshold_km: 1.0,
            proximity: None,
        }
    }
}

/// What the search UI should show.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "suggestions", rename_all = "snake_case")]
pub enum SearchState {
    /// Full resolution pending; carries the instant catalog results
    Loading(Vec<LocationSuggestion>),
    Results(Vec<LocationSuggestion>),
    NoResults,
    /// At least one remote source failed; carries what the others returned
    Degraded(Vec<LocationSuggestion>),
}

impl SearchState {
    pub fn suggestions(&self) -> &[LocationSuggestion] {
        match self {
            SearchState::Loading(s) | SearchState::Results(s) | SearchState::Degraded(s) => s,
            SearchState::NoResults => &[],
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, SearchState::Loading(_))
    }
}

impl std::fmt::Display for SearchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchState::Loading(_) => write!(f, "loading"),
            SearchState::Results(_) => write!(f, "results"),
            SearchState::NoResults => write!(f, "no-results"),
            SearchState::Degraded(_) => write!(f, "degraded"),
        }
    }
}

/// Result of one resolve call, tagged with its generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveOutcome {
    pub query: String,
    pub generation: u64,
    pub state: SearchState,
}

/// Location resolver.
///
/// Holds one session token for its whole lifetime; every suggest and
/// retrieve call made through it is billed to that session.
pub struct LocationResolver {
    catalog: Arc<dyn CityCatalog>,
    cities: Option<Arc<dyn CityRepository>>,
    places: Option<Arc<dyn PlaceSearch>>,
    recent: Option<Arc<dyn RecentSearchStore>>,
    settings: ResolverSettings,
    session: SessionToken,
    generation: AtomicU64,
}

impl LocationResolver {
    /// Create a new resolver.
    pub fn new(
        catalog: Arc<dyn CityCatalog>,
        cities: Option<Arc<dyn CityRepository>>,
        places: Option<Arc<dyn PlaceSearch>>,
        recent: Option<Arc<dyn RecentSearchStore>>,
        settings: ResolverSettings,
    ) -> Self {
        Self {
            catalog,
            cities,
            places,
            recent,
            settings,
            session: SessionToken::new(),
            generation: AtomicU64::new(0),
        }
    }

    pub fn session_token(&self) -> &SessionToken {
        &self.session
    }

    pub fn settings(&self) -> &ResolverSettings {
        &self.settings
    }

    /// Resolve a query against every source.
    ///
    /// Never fails: remote errors are logged and reported as
    /// [`SearchState::Degraded`].
    pub async fn resolve(&self, query: &str) -> ResolveOutcome {
        let generation = self.supersede();
        let query = query.trim();

        if query.is_empty() {
            return self.outcome(query, generation, self.defaults());
        }

        let local = self.catalog_matches(query);
        let (remote, backend) = tokio::join!(self.remote_matches(query), self.backend_matches(query));

        let mut degraded = false;
        let backend = backend.unwrap_or_else(|e| {
            tracing::warn!("backend cities unavailable for {:?}: {}", query, e);
            degraded = true;
            Vec::new()
        });
        let mut remote = remote.unwrap_or_else(|e| {
            tracing::warn!("place search unavailable for {:?}: {}", query, e);
            degraded = true;
            Vec::new()
        });
        LocationMerger::rank_remote(&mut remote, self.settings.proximity);

        let merged = LocationMerger::merge(
            vec![local, backend, remote],
            self.settings.dedup_threshold_km,
            self.settings.max_results,
        );

        tracing::debug!(
            "resolved {:?} (generation {}): {} suggestions{}",
            query,
            generation,
            merged.len(),
            if degraded { ", degraded" } else { "" }
        );

        let state = if degraded {
            SearchState::Degraded(merged)
        } else if merged.is_empty() {
            SearchState::NoResults
        } else {
            SearchState::Results(merged)
        };

        self.outcome(query, generation, state)
    }

    /// Catalog-only answer, available without waiting on the network.
    ///
    /// Non-empty queries come back as [`SearchState::Loading`] since the
    /// remote sources have not been asked yet.
    pub fn instant(&self, query: &str) -> SearchState {
        let query = query.trim();
        if query.is_empty() {
            return self.defaults();
        }
        SearchState::Loading(self.catalog_matches(query))
    }

    /// Mark every outstanding resolve as stale. Returns the new generation.
    pub fn supersede(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Whether an outcome with this generation may still be applied.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Make sure a suggestion has coordinates, asking the remote source
    /// when it does not.
    pub async fn retrieve(
        &self,
        suggestion: &LocationSuggestion,
    ) -> Result<ResolvedLocation, SearchError> {
        if let Some(resolved) = suggestion.to_resolved() {
            return Ok(resolved);
        }

        let places = self
            .places
            .as_ref()
            .ok_or_else(|| SearchError::Unresolved(suggestion.id.clone()))?;

        tracing::debug!("retrieving coordinates for {}", suggestion.id);
        places.retrieve(&suggestion.source_ref, &self.session).await
    }

    /// Resolve a suggestion, write it to the selection store and remember
    /// it as a recent search.
    ///
    /// The store is left untouched when the suggestion cannot be resolved.
    pub async fn select(
        &self,
        suggestion: &LocationSuggestion,
        store: &SelectionStore,
    ) -> Result<ResolvedLocation, SearchError> {
        let location = self.retrieve(suggestion).await.map_err(|e| {
            tracing::warn!("cannot select {}: {}", suggestion.name, e);
            e
        })?;

        let selected = store.select_location(&location);
        tracing::info!("selected {} ({})", selected.data.label, selected.value);

        if let Some(recent) = &self.recent {
            if let Err(e) = recent.record(&location).await {
                tracing::warn!("failed to record recent search: {}", e);
            }
        }

        Ok(location)
    }

    /// Recent searches, most recent first. Empty when none are kept.
    pub async fn recent_searches(&self) -> Result<Vec<RecentSearch>, SearchError> {
        match &self.recent {
            Some(recent) => recent.list().await,
            None => Ok(Vec::new()),
        }
    }

    pub async fn clear_recent_searches(&self) -> Result<(), SearchError> {
        match &self.recent {
            Some(recent) => recent.clear().await,
            None => Ok(()),
        }
    }

    fn defaults(&self) -> SearchState {
        let top: Vec<_> = self
            .catalog
            .top(self.settings.max_results)
            .iter()
            .map(LocationSuggestion::from_catalog)
            .collect();

        if top.is_empty() {
            SearchState::NoResults
        } else {
            SearchState::Results(top)
        }
    }

    fn catalog_matches(&self, query: &str) -> Vec<LocationSuggestion> {
        self.catalog
            .search(query)
            .iter()
            .map(LocationSuggestion::from_catalog)
            .collect()
    }

    async fn remote_matches(&self, query: &str) -> Result<Vec<LocationSuggestion>, SearchError> {
        match &self.places {
            Some(places) => places.suggest(query, &self.session).await,
            None => Ok(Vec::new()),
        }
    }

    /// Filter the cached backend list locally; fall back to the server-side
    /// search when the list cannot be loaded.
    async fn backend_matches(&self, query: &str) -> Result<Vec<LocationSuggestion>, SearchError> {
        let Some(cities) = &self.cities else {
            return Ok(Vec::new());
        };

        let records = match cities.list_cities().await {
            Ok(all) => {
                let needle = normalize_name(query);
                all.into_iter()
                    .filter(|c| LocationMerger::city_matches(c, &needle))
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::debug!("city list unavailable ({}), searching by name", e);
                cities.search_cities(query).await?
            }
        };

        Ok(records.iter().map(LocationSuggestion::from_backend).collect())
    }

    fn outcome(&self, query: &str, generation: u64, state: SearchState) -> ResolveOutcome {
        ResolveOutcome {
            query: query.to_string(),
            generation,
            state,
        }
    }
}
