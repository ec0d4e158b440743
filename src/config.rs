use crate::domain::value_objects::Coordinates;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    // Backend city API
    pub api_base_url: String,
    pub city_cache_ttl_secs: u64,

    // Remote place search
    pub search_base_url: String,
    pub geocoding_base_url: String,
    pub access_token: String,
    pub country: Option<String>,
    pub proximity: Option<Coordinates>,
    pub suggest_limit: usize,
    pub request_timeout_ms: u64,

    // Resolver behaviour
    pub max_results: usize,
    pub debounce_ms: u64,
    pub dedup_threshold_km: f64,

    // Client state
    pub recent_db_path: Option<String>,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:3000".to_string(),
            city_cache_ttl_secs: 3600,
            search_base_url: "https://api.mapbox.com/search/searchbox/v1".to_string(),
            geocoding_base_url: "https://api.mapbox.com".to_string(),
            access_token: String::new(),
            country: Some("ma".to_string()),
            proximity: None,
            suggest_limit: 5,
            request_timeout_ms: 4000,
            max_results: 8,
            debounce_ms: 300,
            dedup_threshold_km: 1.0,
            recent_db_path: None,
            debug: false,
        }
    }
}

pub fn load_config() -> anyhow::Result<Config> {
    let api_base_url = std::env::var("EXLOC_API_BASE_URL")
        .unwrap_or_else(|_| "http://localhost:3000".to_string());

    let city_cache_ttl_secs = std::env::var("EXLOC_CITY_CACHE_TTL_SECS")
        .unwrap_or_else(|_| "3600".to_string())
        .parse()
        .unwrap_or(3600);

    let search_base_url = std::env::var("EXLOC_SEARCH_BASE_URL")
        .unwrap_or_else(|_| "https://api.mapbox.com/search/searchbox/v1".to_string());

    let geocoding_base_url = std::env::var("EXLOC_GEOCODING_BASE_URL")
        .unwrap_or_else(|_| "https://api.mapbox.com".to_string());

    let access_token = std::env::var("EXLOC_ACCESS_TOKEN").unwrap_or_default();

    // Empty string disables the country filter
    let country = match std::env::var("EXLOC_COUNTRY") {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(v.trim().to_lowercase()),
        Err(_) => Some("ma".to_string()),
    };

    let proximity = std::env::var("EXLOC_PROXIMITY")
        .ok()
        .and_then(|v| Coordinates::parse_pair(&v));

    let suggest_limit = std::env::var("EXLOC_SUGGEST_LIMIT")
        .unwrap_or_else(|_| "5".to_string())
        .parse()
        .unwrap_or(5);

    let request_timeout_ms = std::env::var("EXLOC_REQUEST_TIMEOUT_MS")
        .unwrap_or_else(|_| "4000".to_string())
        .parse()
        .unwrap_or(4000);

    let max_results = std::env::var("EXLOC_MAX_RESULTS")
        .unwrap_or_else(|_| "8".to_string())
        .parse()
        .unwrap_or(8);

    let debounce_ms = std::env::var("EXLOC_DEBOUNCE_MS")
        .unwrap_or_else(|_| "300".to_string())
        .parse()
        .unwrap_or(300);

    let dedup_threshold_km = std::env::var("EXLOC_DEDUP_THRESHOLD_KM")
        .unwrap_or_else(|_| "1.0".to_string())
        .parse()
        .unwrap_or(1.0);

    let recent_db_path = std::env::var("EXLOC_RECENT_DB_PATH").ok();

    let debug = std::env::var("DEBUG").is_ok();

    Ok(Config {
        api_base_url,
        city_cache_ttl_secs,
        search_base_url,
        geocoding_base_url,
        access_token,
        country,
        proximity,
        suggest_limit,
        request_timeout_ms,
        max_results,
        debounce_ms,
        dedup_threshold_km,
        recent_db_path,
        debug,
    })
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.api_base_url, "http://localhost:3000");
        assert_eq!(cfg.country.as_deref(), Some("ma"));
        assert_eq!(cfg.max_results, 8);
        assert_eq!(cfg.debounce_ms, 300);
        assert_eq!(cfg.request_timeout_ms, 4000);
        assert_eq!(cfg.dedup_threshold_km, 1.0);
        assert!(cfg.proximity.is_none());
        assert!(cfg.recent_db_path.is_none());
    }

    #[test]
    fn test_load_config_defaults() {
        std::env::remove_var("EXLOC_SUGGEST_LIMIT");
        std::env::remove_var("EXLOC_CITY_CACHE_TTL_SECS");

        let cfg = load_config().unwrap();
        assert_eq!(cfg.suggest_limit, 5);
        assert_eq!(cfg.city_cache_ttl_secs, 3600);
    }

    #[test]
    fn test_config_clone() {
        let cfg = Config::default();
        let cloned = cfg.clone();
        assert_eq!(cfg.search_base_url, cloned.search_base_url);
        assert_eq!(cfg.country, cloned.country);
    }

    #[test]
    fn test_config_debug() {
        let cfg = Config::default();
        let debug_str = format!("{:?}", cfg);
        assert!(debug_str.contains("api_base_url"));
        assert!(debug_str.contains("localhost:3000"));
    }

    #[test]
    fn test_load_config_with_custom_urls() {
        std::env::set_var("EXLOC_API_BASE_URL", "http://127.0.0.1:9000");
        std::env::set_var("EXLOC_SEARCH_BASE_URL", "http://127.0.0.1:9001/search");
        std::env::set_var("EXLOC_GEOCODING_BASE_URL", "http://127.0.0.1:9002");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.api_base_url, "http://127.0.0.1:9000");
        assert_eq!(cfg.search_base_url, "http://127.0.0.1:9001/search");
        assert_eq!(cfg.geocoding_base_url, "http://127.0.0.1:9002");
        std::env::remove_var("EXLOC_API_BASE_URL");
        std::env::remove_var("EXLOC_SEARCH_BASE_URL");
        std::env::remove_var("EXLOC_GEOCODING_BASE_URL");
    }

    #[test]
    fn test_load_config_with_access_token() {
        std::env::set_var("EXLOC_ACCESS_TOKEN", "pk.test");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.access_token, "pk.test");
        std::env::remove_var("EXLOC_ACCESS_TOKEN");
    }

    #[test]
    fn test_load_config_country() {
        let cases = vec![("FR", Some("fr")), (" es ", Some("es")), ("", None)];

        for (input, expected) in cases {
            std::env::set_var("EXLOC_COUNTRY", input);
            let cfg = load_config().unwrap();
            assert_eq!(cfg.country.as_deref(), expected, "Failed for input: {:?}", input);
        }
        std::env::remove_var("EXLOC_COUNTRY");
    }

    #[test]
    fn test_load_config_with_proximity() {
        std::env::set_var("EXLOC_PROXIMITY", "-7.5898,33.5731");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.proximity, Some(Coordinates::new(-7.5898, 33.5731)));

        std::env::set_var("EXLOC_PROXIMITY", "somewhere");
        let cfg = load_config().unwrap();
        assert!(cfg.proximity.is_none());
        std::env::remove_var("EXLOC_PROXIMITY");
    }

    #[test]
    fn test_load_config_with_resolver_settings() {
        std::env::set_var("EXLOC_MAX_RESULTS", "12");
        std::env::set_var("EXLOC_DEDUP_THRESHOLD_KM", "2.5");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.max_results, 12);
        assert_eq!(cfg.dedup_threshold_km, 2.5);
        std::env::remove_var("EXLOC_MAX_RESULTS");
        std::env::remove_var("EXLOC_DEDUP_THRESHOLD_KM");
    }

    #[test]
    fn test_load_config_with_timing() {
        std::env::set_var("EXLOC_DEBOUNCE_MS", "150");
        std::env::set_var("EXLOC_REQUEST_TIMEOUT_MS", "2500");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.debounce_ms, 150);
        assert_eq!(cfg.request_timeout_ms, 2500);
        std::env::remove_var("EXLOC_DEBOUNCE_MS");
        std::env::remove_var("EXLOC_REQUEST_TIMEOUT_MS");
    }

    #[test]
    fn test_load_config_with_recent_db_path() {
        std::env::set_var("EXLOC_RECENT_DB_PATH", "/tmp/recent.db");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.recent_db_path, Some("/tmp/recent.db".to_string()));
        std::env::remove_var("EXLOC_RECENT_DB_PATH");
    }

    #[test]
    fn test_load_config_with_debug() {
        std::env::set_var("DEBUG", "1");
        let cfg = load_config().unwrap();
        assert!(cfg.debug);
        std::env::remove_var("DEBUG");
    }

    #[test]
    fn test_load_config_parse_error_uses_default() {
        std::env::set_var("EXLOC_SUGGEST_LIMIT", "not_a_number");
        std::env::set_var("EXLOC_CITY_CACHE_TTL_SECS", "-1");
        let cfg = load_config().unwrap();
        assert_eq!(cfg.suggest_limit, 5); // default
        assert_eq!(cfg.city_cache_ttl_secs, 3600); // default
        std::env::remove_var("EXLOC_SUGGEST_LIMIT");
        std::env::remove_var("EXLOC_CITY_CACHE_TTL_SECS");
    }
}
