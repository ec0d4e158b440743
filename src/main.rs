//! exchange-locator - Location search for the exchange rate comparator
//!
//! This is the composition root that wires together all the components and
//! drives them from a line-oriented terminal harness.

use exchange_locator::adapters::outbound::{
    CityApiConfig, FallbackPlaceSearch, GeocodingClient, GeocodingConfig, HttpCityRepository,
    MemoryRecentSearches, SearchBoxClient, SearchBoxConfig, SimulatedViewport,
    SqliteRecentSearches, StaticCityCatalog,
};
use exchange_locator::application::{LocationResolver, ResolverSettings, SearchSession, SearchView};
use exchange_locator::config::{load_config, Config};
use exchange_locator::domain::ports::{MapViewport, PlaceSearch, RecentSearchStore};
use exchange_locator::domain::services::ViewportTransform;
use exchange_locator::domain::value_objects::Coordinates;
use exchange_locator::infrastructure::MarkerBinder;
use exchange_locator::state::SelectionStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::fmt::format::FmtSpan;

/// Zoom used when flying to a selected city.
const SELECTION_ZOOM: f64 = 12.0;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from environment
    let cfg = load_config()?;

    // Setup logging
    let log_level = if cfg.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(
        "starting exchange-locator api={} country={:?}",
        cfg.api_base_url,
        cfg.country
    );

    // ===== COMPOSITION ROOT =====

    // 1. Create outbound adapters
    let timeout = Duration::from_millis(cfg.request_timeout_ms);

    let catalog = Arc::new(StaticCityCatalog::bundled());

    let cities = Arc::new(HttpCityRepository::new(CityApiConfig {
        base_url: cfg.api_base_url.clone(),
        cache_ttl: Duration::from_secs(cfg.city_cache_ttl_secs),
        timeout,
        ..CityApiConfig::default()
    })?);

    let places = build_place_search(&cfg, timeout)?;

    let recent: Arc<dyn RecentSearchStore> = match &cfg.recent_db_path {
        Some(path) => {
            tracing::info!("recent searches stored in {}", path);
            Arc::new(SqliteRecentSearches::open(path)?)
        }
        None => Arc::new(MemoryRecentSearches::new()),
    };

    let viewport = Arc::new(SimulatedViewport::ready(ViewportTransform::new(
        cfg.proximity.unwrap_or(Coordinates::new(-7.5898, 33.5731)),
        5.0,
        1280.0,
        720.0,
    )));

    // 2. Create application services
    let resolver = Arc::new(LocationResolver::new(
        catalog,
        Some(cities),
        places,
        Some(recent),
        ResolverSettings {
            max_results: cfg.max_results,
            dedup_threshold_km: cfg.dedup_threshold_km,
            proximity: cfg.proximity,
        },
    ));
    let store = SelectionStore::new();
    let session = SearchSession::open(Arc::clone(&resolver), Duration::from_millis(cfg.debounce_ms));

    // 3. Drive the session from stdin
    let settle = Duration::from_millis(cfg.debounce_ms + cfg.request_timeout_ms + 500);
    let mut marker: Option<MarkerBinder> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => break,
            (":clear", _) => {
                store.clear();
                marker = None;
                println!("{}", serde_json::json!({ "selection": null }));
            }
            (":recent", _) => match resolver.recent_searches().await {
                Ok(recent) => println!("{}", serde_json::to_string_pretty(&recent)?),
                Err(e) => tracing::error!("cannot read recent searches: {}", e),
            },
            (":select", index) => {
                let Ok(index) = index.trim().parse::<usize>() else {
                    tracing::warn!("usage: :select N");
                    continue;
                };
                match session.choose(index, &store).await {
                    Ok(location) => {
                        viewport.fly_to(&location, SELECTION_ZOOM);
                        let binder = marker.get_or_insert_with(|| {
                            MarkerBinder::new(viewport.clone(), &location)
                        });
                        binder.move_to(&location);
                        if !binder.is_attached() {
                            if let Err(e) = binder.attach() {
                                tracing::warn!("marker not shown: {}", e);
                            }
                        }
                        println!(
                            "{}",
                            serde_json::to_string_pretty(&serde_json::json!({
                                "selection": store.get(),
                                "marker": binder.position(),
                            }))?
                        );
                    }
                    Err(e) => tracing::warn!("selection failed: {}", e),
                }
            }
            _ => {
                session.input(line);
                let view = wait_for_resolution(&session, settle).await;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
        }
    }

    session.close();
    tracing::info!("bye");
    Ok(())
}

/// Search box first, geocoder as fallback. Without an access token only
/// the catalog and the backend city list are searched.
fn build_place_search(
    cfg: &Config,
    timeout: Duration,
) -> anyhow::Result<Option<Arc<dyn PlaceSearch>>> {
    if cfg.access_token.is_empty() {
        tracing::warn!("EXLOC_ACCESS_TOKEN not set, remote place search disabled");
        return Ok(None);
    }

    let search_box = Arc::new(SearchBoxClient::new(SearchBoxConfig {
        base_url: cfg.search_base_url.clone(),
        access_token: cfg.access_token.clone(),
        country: cfg.country.clone(),
        proximity: cfg.proximity,
        limit: cfg.suggest_limit,
        timeout,
    })?);

    let geocoder = Arc::new(GeocodingClient::new(GeocodingConfig {
        base_url: cfg.geocoding_base_url.clone(),
        access_token: cfg.access_token.clone(),
        country: cfg.country.clone(),
        proximity: cfg.proximity,
        limit: cfg.suggest_limit,
        timeout,
        ..GeocodingConfig::default()
    })?);

    Ok(Some(Arc::new(FallbackPlaceSearch::new(search_box, geocoder))))
}

/// Wait until the debounced resolution replaces the instant results.
async fn wait_for_resolution(session: &SearchSession, settle: Duration) -> SearchView {
    let mut rx = session.subscribe();
    let _ = tokio::time::timeout(settle, async {
        loop {
            if !rx.borrow_and_update().state.is_loading() {
                break;
            }
            if rx.changed().await.is_err() {
                break;
            }
        }
    })
    .await;
    session.current()
}
