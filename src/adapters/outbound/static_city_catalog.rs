//! Static City Catalog
//!
//! Implements CityCatalog using a list compiled into the binary.

use crate::domain::entities::CityRecord;
use crate::domain::ports::CityCatalog;
use crate::domain::services::{normalize_name, LocationMerger};
use crate::domain::value_objects::Coordinates;
use std::sync::Arc;

/// (id, name, region, longitude, latitude, population)
type CityRow = (&'static str, &'static str, &'static str, f64, f64, u64);

/// Cities served by the exchange office network.
const BUNDLED_CITIES: &[CityRow] = &[
    ("ma-casablanca", "Casablanca", "Casablanca-Settat", -7.5898, 33.5731, 3_359_818),
    ("ma-fes", "Fès", "Fès-Meknès", -5.0078, 34.0181, 1_112_072),
    ("ma-tanger", "Tanger", "Tanger-Tétouan-Al Hoceïma", -5.8340, 35.7595, 947_952),
    ("ma-marrakech", "Marrakech", "Marrakech-Safi", -7.9811, 31.6295, 928_850),
    ("ma-sale", "Salé", "Rabat-Salé-Kénitra", -6.7985, 34.0531, 890_403),
    ("ma-meknes", "Meknès", "Fès-Meknès", -5.5473, 33.8935, 632_079),
    ("ma-rabat", "Rabat", "Rabat-Salé-Kénitra", -6.8498, 34.0209, 577_827),
    ("ma-oujda", "Oujda", "Oriental", -1.9086, 34.6814, 494_252),
    ("ma-kenitra", "Kénitra", "Rabat-Salé-Kénitra", -6.5802, 34.2610, 431_282),
    ("ma-agadir", "Agadir", "Souss-Massa", -9.5981, 30.4278, 421_844),
    ("ma-tetouan", "Tétouan", "Tanger-Tétouan-Al Hoceïma", -5.3684, 35.5785, 380_787),
    ("ma-temara", "Témara", "Rabat-Salé-Kénitra", -6.9066, 33.9287, 313_510),
    ("ma-safi", "Safi", "Marrakech-Safi", -9.2372, 32.2994, 308_508),
    ("ma-laayoune", "Laâyoune", "Laâyoune-Sakia El Hamra", -13.2033, 27.1253, 217_732),
    ("ma-mohammedia", "Mohammedia", "Casablanca-Settat", -7.3830, 33.6861, 208_612),
    ("ma-khouribga", "Khouribga", "Béni Mellal-Khénifra", -6.9063, 32.8811, 196_196),
    ("ma-el-jadida", "El Jadida", "Casablanca-Settat", -8.5007, 33.2316, 194_934),
    ("ma-beni-mellal", "Béni Mellal", "Béni Mellal-Khénifra", -6.3498, 32.3373, 192_676),
    ("ma-nador", "Nador", "Oriental", -2.9287, 35.1681, 161_726),
    ("ma-taza", "Taza", "Fès-Meknès", -4.0103, 34.2100, 148_406),
    ("ma-settat", "Settat", "Casablanca-Settat", -7.6164, 33.0013, 142_250),
    ("ma-dakhla", "Dakhla", "Dakhla-Oued Ed-Dahab", -15.9570, 23.6848, 106_277),
    ("ma-essaouira", "Essaouira", "Marrakech-Safi", -9.7595, 31.5085, 77_966),
    ("ma-ouarzazate", "Ouarzazate", "Drâa-Tafilalet", -6.8936, 30.9335, 71_067),
    ("ma-chefchaouen", "Chefchaouen", "Tanger-Tétouan-Al Hoceïma", -5.2636, 35.1688, 42_786),
    ("ma-ifrane", "Ifrane", "Fès-Meknès", -5.1106, 33.5228, 14_659),
];

/// Compiled city catalog.
///
/// Cities are kept sorted by population (descending, then name), which is
/// the order used for both the empty-query defaults and search results.
#[derive(Clone)]
pub struct StaticCityCatalog {
    cities: Arc<[CityRecord]>,
}

impl StaticCityCatalog {
    /// Load the bundled catalog.
    pub fn bundled() -> Self {
        let records = BUNDLED_CITIES
            .iter()
            .map(|&(id, name, region, lng, lat, population)| CityRecord {
                id: id.to_string(),
                name: name.to_string(),
                coordinates: Coordinates::new(lng, lat),
                region: Some(region.to_string()),
                population: Some(population),
            })
            .collect();
        Self::from_records(records)
    }

    /// Build a catalog from arbitrary records.
    pub fn from_records(mut records: Vec<CityRecord>) -> Self {
        records.sort_by(|a, b| {
            b.population
                .unwrap_or(0)
                .cmp(&a.population.unwrap_or(0))
                .then_with(|| a.name.cmp(&b.name))
        });
        Self {
            cities: records.into(),
        }
    }
}

impl Default for StaticCityCatalog {
    fn default() -> Self {
        Self::bundled()
    }
}

impl CityCatalog for StaticCityCatalog {
    fn top(&self, limit: usize) -> Vec<CityRecord> {
        self.cities.iter().take(limit).cloned().collect()
    }

    fn search(&self, query: &str) -> Vec<CityRecord> {
        let q = normalize_name(query);
        if q.is_empty() {
            return Vec::new();
        }

        // Name matches first, then region-only matches
        let (mut by_name, by_region): (Vec<_>, Vec<_>) = self
            .cities
            .iter()
            .filter(|c| LocationMerger::city_matches(c, &q))
            .cloned()
            .partition(|c| normalize_name(&c.name).contains(&q));

        by_name.extend(by_region);
        by_name
    }

    fn len(&self) -> usize {
        self.cities.len()
    }
}
