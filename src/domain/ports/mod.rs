mod city_catalog;
mod city_repository;
mod map_viewport;
mod place_search;
mod recent_searches;

pub use city_catalog::CityCatalog;
pub use city_repository::CityRepository;
pub use map_viewport::{ListenerId, MapViewport, ViewportListener};
pub use place_search::PlaceSearch;
pub use recent_searches::{RecentSearchStore, MAX_RECENT_SEARCHES};
