//! Location Merger Service
//!
//! Pure domain logic for merging suggestion lists from several sources.
//! This service has NO external dependencies - it's pure Rust.

use crate::domain::entities::{CityRecord, LocationSuggestion};
use crate::domain::value_objects::Coordinates;

/// Merges, deduplicates, ranks and caps suggestion lists.
///
/// Two suggestions are the same place when their names normalize equal
/// AND they lie closer than the proximity threshold. An unresolved
/// suggestion cannot be measured, so it is folded into an already kept
/// resolved entry with the same normalized name. Two unresolved entries
/// are the same place only when their formatted places also match.
pub struct LocationMerger;

impl LocationMerger {
    /// Merge suggestion groups in priority order.
    ///
    /// Earlier groups win: an entry from a later group is dropped when it
    /// duplicates anything already kept. The result holds at most
    /// `max_results` entries.
    pub fn merge(
        groups: Vec<Vec<LocationSuggestion>>,
        threshold_km: f64,
        max_results: usize,
    ) -> Vec<LocationSuggestion> {
        let mut merged: Vec<LocationSuggestion> = Vec::new();
        let mut keys: Vec<String> = Vec::new();

        for group in groups {
            for candidate in group {
                if merged.len() >= max_results {
                    return merged;
                }

                let key = normalize_name(&candidate.name);
                let duplicate = merged
                    .iter()
                    .zip(keys.iter())
                    .any(|(kept, kept_key)| {
                        kept_key == &key && Self::same_place(kept, &candidate, threshold_km)
                    });

                if duplicate {
                    continue;
                }

                keys.push(key);
                merged.push(candidate);
            }
        }

        merged
    }

    /// Whether `candidate` refers to the same place as `kept`, given equal
    /// normalized names.
    fn same_place(
        kept: &LocationSuggestion,
        candidate: &LocationSuggestion,
        threshold_km: f64,
    ) -> bool {
        if kept.id == candidate.id {
            return true;
        }
        match (kept.resolution.coordinates(), candidate.resolution.coordinates()) {
            (Some(ck), Some(cc)) => ck.distance_km(&cc) < threshold_km,
            (Some(_), None) => true,
            (None, None) => {
                normalize_name(&kept.place_formatted) == normalize_name(&candidate.place_formatted)
            }
            // A resolved entry is never swallowed by an unresolved one
            (None, Some(_)) => false,
        }
    }

    /// Whether `candidate` collapses into the already kept `kept`.
    pub fn is_duplicate(
        kept: &LocationSuggestion,
        candidate: &LocationSuggestion,
        threshold_km: f64,
    ) -> bool {
        normalize_name(&kept.name) == normalize_name(&candidate.name)
            && Self::same_place(kept, candidate, threshold_km)
    }

    /// Order remote suggestions: places before addresses, then by
    /// distance to the proximity point when one is known.
    ///
    /// The sort is stable, so the provider's own relevance order is kept
    /// within a tier.
    pub fn rank_remote(suggestions: &mut [LocationSuggestion], proximity: Option<Coordinates>) {
        suggestions.sort_by(|a, b| {
            let tier = a.feature_type.rank().cmp(&b.feature_type.rank());
            if tier != std::cmp::Ordering::Equal {
                return tier;
            }
            match proximity {
                Some(origin) => {
                    let da = Self::distance_from(a, &origin);
                    let db = Self::distance_from(b, &origin);
                    da.total_cmp(&db)
                }
                None => std::cmp::Ordering::Equal,
            }
        });
    }

    /// Unresolved suggestions sort after resolved ones in the same tier.
    fn distance_from(s: &LocationSuggestion, origin: &Coordinates) -> f64 {
        s.resolution
            .coordinates()
            .map(|c| c.distance_km(origin))
            .unwrap_or(f64::MAX)
    }

    /// Whether a city matches a query on name or region.
    pub fn city_matches(city: &CityRecord, normalized_query: &str) -> bool {
        if normalized_query.is_empty() {
            return true;
        }
        if normalize_name(&city.name).contains(normalized_query) {
            return true;
        }
        city.region
            .as_deref()
            .map(|r| normalize_name(r).contains(normalized_query))
            .unwrap_or(false)
    }
}

/// Normalize a place name for comparison.
///
/// Lowercases, folds common Latin accents and collapses punctuation and
/// whitespace runs into a single space.
pub fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_space = false;
            match fold_char(c) {
                Some(folded) => out.push_str(folded),
                None => out.push(c),
            }
        } else {
            pending_space = true;
        }
    }

    out
}

fn fold_char(c: char) -> Option<&'static str> {
    let folded = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ß' => "ss",
        'š' | 'ś' => "s",
        'ž' | 'ź' | 'ż' => "z",
        'ł' => "l",
        _ => return None,
    };
    Some(folded)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::entities::SourceRef;
    use crate::domain::value_objects::{FeatureType, Resolution};

    fn suggestion(id: &str, name: &str, coords: Option<(f64, f64)>) -> LocationSuggestion {
        LocationSuggestion {
            id: id.to_string(),
            name: name.to_string(),
            place_formatted: String::new(),
            feature_type: FeatureType::Place,
            resolution: Resolution::from_provider(coords.map(|(lng, lat)| Coordinates::new(lng, lat))),
            source_ref: SourceRef::SearchBox {
                mapbox_id: id.to_string(),
            },
        }
    }

    // ===== normalize_name Tests =====

    #[test]
    fn test_normalize_name() {
        let tests = vec![
            ("Casablanca", "casablanca"),
            ("  CASABLANCA ", "casablanca"),
            ("Fès", "fes"),
            ("Meknès-Tafilalet", "meknes tafilalet"),
            ("Aït Melloul", "ait melloul"),
            ("Saint-Étienne", "saint etienne"),
            ("", ""),
            ("--", ""),
        ];

        for (input, expected) in tests {
            assert_eq!(normalize_name(input), expected, "Failed for input: {}", input);
        }
    }

    // ===== merge Tests =====

    #[test]
    fn test_merge_keeps_priority_order() {
        let catalog = vec![suggestion("c1", "Casablanca", Some((-7.5898, 33.5731)))];
        let remote = vec![
            suggestion("r1", "Casablanca", Some((-7.5900, 33.5735))),
            suggestion("r2", "Casa Port", Some((-7.6140, 33.5990))),
        ];

        let merged = LocationMerger::merge(vec![catalog, remote], 1.0, 10);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].id, "c1");
        assert_eq!(merged[1].id, "r2");
    }

    #[test]
    fn test_merge_same_name_far_apart_kept() {
        // Two different "Santa Cruz" hundreds of km apart
        let a = vec![suggestion("a", "Santa Cruz", Some((-122.03, 36.97)))];
        let b = vec![suggestion("b", "Santa Cruz", Some((-16.25, 28.46)))];

        let merged = LocationMerger::merge(vec![a, b], 1.0, 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_near_but_different_name_kept() {
        let a = vec![suggestion("a", "Casablanca", Some((-7.5898, 33.5731)))];
        let b = vec![suggestion("b", "Maarif", Some((-7.5899, 33.5732)))];

        let merged = LocationMerger::merge(vec![a, b], 1.0, 10);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_merge_accent_variants_collapse() {
        let a = vec![suggestion("a", "Fès", Some((-5.0078, 34.0181)))];
        let b = vec![suggestion("b", "Fes", Some((-5.0080, 34.0190)))];

        let merged = LocationMerger::merge(vec![a, b], 1.0, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "a");
    }

    #[test]
    fn test_merge_unresolved_same_name_collapses() {
        let a = vec![suggestion("a", "Casablanca", Some((-7.5898, 33.5731)))];
        let b = vec![suggestion("b", "Casablanca", None)];

        let merged = LocationMerger::merge(vec![a, b], 1.0, 10);
        assert_eq!(merged.len(), 1);
        assert!(merged[0].is_resolved());
    }

    #[test]
    fn test_merge_unresolved_homonyms_kept_apart() {
        let mut idf = suggestion("a", "Saint-Denis", None);
        idf.place_formatted = "Île-de-France, France".to_string();
        let mut reunion = suggestion("b", "Saint-Denis", None);
        reunion.place_formatted = "Réunion, France".to_string();

        let merged = LocationMerger::merge(vec![vec![idf, reunion]], 1.0, 10);
        let ids: Vec<_> = merged.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_merge_unresolved_same_formatted_place_collapses() {
        let mut a = suggestion("a", "Saint-Denis", None);
        a.place_formatted = "Réunion, France".to_string();
        let mut b = suggestion("b", "Saint Denis", None);
        b.place_formatted = "Reunion, France".to_string();

        let merged = LocationMerger::merge(vec![vec![a], vec![b]], 1.0, 10);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "a");
    }

    #[test]
    fn test_merge_resolved_not_swallowed_by_unresolved() {
        let mut texas = suggestion("a", "Paris", None);
        texas.place_formatted = "Texas, United States".to_string();
        let france = suggestion("b", "Paris", Some((2.35, 48.85)));

        let merged = LocationMerger::merge(vec![vec![texas], vec![france]], 1.0, 10);
        assert_eq!(merged.len(), 2);
        assert!(merged[1].is_resolved());
    }

    #[test]
    fn test_is_duplicate_direction() {
        let resolved = suggestion("a", "Rabat", Some((-6.8498, 34.0209)));
        let unresolved = suggestion("b", "Rabat", None);

        assert!(LocationMerger::is_duplicate(&resolved, &unresolved, 1.0));
        assert!(!LocationMerger::is_duplicate(&unresolved, &resolved, 1.0));
    }

    #[test]
    fn test_merge_same_id_collapses() {
        let a = vec![suggestion("x", "Rabat", Some((-6.8498, 34.0209)))];
        let b = vec![suggestion("x", "Rabat", Some((-6.8498, 34.0209)))];

        assert_eq!(LocationMerger::merge(vec![a, b], 1.0, 10).len(), 1);
    }

    #[test]
    fn test_merge_caps_results() {
        let many: Vec<_> = (0..20)
            .map(|i| suggestion(&format!("s{}", i), &format!("Place {}", i), Some((i as f64, 10.0))))
            .collect();

        for max in [0, 1, 5, 8] {
            let merged = LocationMerger::merge(vec![many.clone()], 1.0, max);
            assert_eq!(merged.len(), max);
        }
    }

    #[test]
    fn test_merge_empty() {
        assert!(LocationMerger::merge(vec![vec![], vec![]], 1.0, 8).is_empty());
    }

    #[test]
    fn test_is_duplicate_threshold() {
        let a = suggestion("a", "Rabat", Some((-6.8498, 34.0209)));
        // ~2 km east
        let b = suggestion("b", "Rabat", Some((-6.8281, 34.0209)));

        assert!(!LocationMerger::is_duplicate(&a, &b, 1.0));
        assert!(LocationMerger::is_duplicate(&a, &b, 5.0));
    }

    // ===== rank_remote Tests =====

    #[test]
    fn test_rank_remote_places_first() {
        let mut poi = suggestion("poi", "Twin Center", Some((-7.63, 33.58)));
        poi.feature_type = FeatureType::Poi;
        let mut address = suggestion("addr", "Rue Tata", Some((-7.61, 33.59)));
        address.feature_type = FeatureType::Address;
        let place = suggestion("place", "Casablanca", Some((-7.5898, 33.5731)));

        let mut list = vec![address, poi, place];
        LocationMerger::rank_remote(&mut list, None);

        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["place", "poi", "addr"]);
    }

    #[test]
    fn test_rank_remote_by_proximity() {
        let far = suggestion("far", "Marrakech", Some((-7.9811, 31.6295)));
        let near = suggestion("near", "Mohammedia", Some((-7.3830, 33.6861)));
        let unresolved = suggestion("unres", "Mediouna", None);

        let mut list = vec![unresolved, far, near];
        let casablanca = Coordinates::new(-7.5898, 33.5731);
        LocationMerger::rank_remote(&mut list, Some(casablanca));

        let ids: Vec<_> = list.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far", "unres"]);
    }

    // ===== city_matches Tests =====

    #[test]
    fn test_city_matches_name_and_region() {
        let city = CityRecord {
            id: "ma-fes".to_string(),
            name: "Fès".to_string(),
            coordinates: Coordinates::new(-5.0078, 34.0181),
            region: Some("Fès-Meknès".to_string()),
            population: None,
        };

        assert!(LocationMerger::city_matches(&city, "fe"));
        assert!(LocationMerger::city_matches(&city, "meknes"));
        assert!(LocationMerger::city_matches(&city, ""));
        assert!(!LocationMerger::city_matches(&city, "rabat"));
    }
}
