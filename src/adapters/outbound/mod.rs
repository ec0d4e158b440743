mod fallback_place_search;
mod geocoding_client;
mod http_city_repo;
mod memory_recent_searches;
mod search_box_client;
mod simulated_viewport;
mod sqlite_recent_searches;
mod static_city_catalog;

pub use fallback_place_search::FallbackPlaceSearch;
pub use geocoding_client::{GeocodingClient, GeocodingConfig};
pub use http_city_repo::{CityApiConfig, HttpCityRepository};
pub use memory_recent_searches::MemoryRecentSearches;
pub use search_box_client::{SearchBoxClient, SearchBoxConfig};
pub use simulated_viewport::SimulatedViewport;
pub use sqlite_recent_searches::SqliteRecentSearches;
pub use static_city_catalog::StaticCityCatalog;
