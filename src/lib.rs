//! exchange-locator Library
//!
//! Location search for the exchange rate comparator: city catalog, remote
//! place search, debounced resolution, the shared selection and the map
//! marker binding. Exposed as a library for the harness binary and for
//! integration tests.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;

// Re-export commonly used types
pub use application::{LocationResolver, ResolveOutcome, ResolverSettings, SearchSession, SearchState};
pub use config::load_config;
pub use domain::entities::{CityRecord, LocationSuggestion, ResolvedLocation, SelectedLocation, SelectionData};
pub use domain::errors::SearchError;
pub use domain::ports::{CityCatalog, CityRepository, MapViewport, PlaceSearch, RecentSearchStore};
pub use domain::value_objects::{Coordinates, Resolution, SessionToken};
pub use infrastructure::{BinderError, Debouncer, MarkerBinder};
pub use state::SelectionStore;
