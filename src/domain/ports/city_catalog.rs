//! City Catalog Port
//!
//! Defines the interface for the bundled, offline city list.

use crate::domain::entities::CityRecord;

/// Read-only list of known cities.
///
/// This is an outbound port for instant, offline-capable results.
/// Implementations must never change after construction.
pub trait CityCatalog: Send + Sync {
    /// Default entries shown for an empty query, in a stable order.
    fn top(&self, limit: usize) -> Vec<CityRecord>;

    /// Cities whose name or region contains the query
    /// (case and accent insensitive).
    fn search(&self, query: &str) -> Vec<CityRecord>;

    /// Total number of cities in the catalog.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
