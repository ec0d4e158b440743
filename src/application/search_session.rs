//! Search Session
//!
//! Drives a search box: instant catalog results on every keystroke, then a
//! debounced full resolution whose outcome is applied only while it is
//! still the newest query.

use crate::application::location_resolver::{LocationResolver, SearchState};
use crate::domain::entities::{LocationSuggestion, ResolvedLocation};
use crate::domain::errors::SearchError;
use crate::infrastructure::debounce::Debouncer;
use crate::state::SelectionStore;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// What the search box currently shows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchView {
    pub query: String,
    pub state: SearchState,
}

type PendingResolve = Pin<Box<dyn Future<Output = (u64, SearchView)> + Send>>;

/// One mounted search box.
///
/// Closing (or dropping) the session aborts the background task, so an
/// in-flight request that completes afterwards changes nothing.
pub struct SearchSession {
    resolver: Arc<LocationResolver>,
    debouncer: Debouncer<String>,
    view: Arc<watch::Sender<SearchView>>,
    task: JoinHandle<()>,
}

impl SearchSession {
    /// Open a session. Must be called inside a tokio runtime.
    pub fn open(resolver: Arc<LocationResolver>, delay: Duration) -> Self {
        let debouncer = Debouncer::new(delay);
        let initial = SearchView {
            query: String::new(),
            state: resolver.instant(""),
        };
        let (view, _) = watch::channel(initial);
        let view = Arc::new(view);

        let task = tokio::spawn(Self::run(
            Arc::clone(&resolver),
            debouncer.subscribe(),
            Arc::clone(&view),
        ));

        Self {
            resolver,
            debouncer,
            view,
            task,
        }
    }

    async fn run(
        resolver: Arc<LocationResolver>,
        mut queries: watch::Receiver<Option<String>>,
        view: Arc<watch::Sender<SearchView>>,
    ) {
        let mut in_flight: Option<PendingResolve> = None;

        loop {
            tokio::select! {
                changed = queries.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let Some(query) = queries.borrow_and_update().clone() else {
                        continue;
                    };
                    // A newer query replaces whatever is still running
                    let resolver = Arc::clone(&resolver);
                    in_flight = Some(Box::pin(async move {
                        let outcome = resolver.resolve(&query).await;
                        (
                            outcome.generation,
                            SearchView {
                                query: outcome.query,
                                state: outcome.state,
                            },
                        )
                    }));
                }
                (generation, next) = async {
                    match in_flight.as_mut() {
                        Some(pending) => pending.await,
                        None => std::future::pending().await,
                    }
                }, if in_flight.is_some() => {
                    in_flight = None;
                    if resolver.is_current(generation) {
                        tracing::debug!("showing {} for {:?}", next.state, next.query);
                        view.send_replace(next);
                    } else {
                        tracing::debug!("discarding stale results for {:?}", next.query);
                    }
                }
            }
        }
    }

    /// Feed the text currently in the search box.
    pub fn input(&self, text: &str) {
        // Anything still resolving belongs to older text now
        self.resolver.supersede();
        self.view.send_replace(SearchView {
            query: text.trim().to_string(),
            state: self.resolver.instant(text),
        });
        self.debouncer.set(text.to_string());
    }

    pub fn set_debounce(&self, delay: Duration) {
        self.debouncer.set_delay(delay);
    }

    pub fn current(&self) -> SearchView {
        self.view.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SearchView> {
        self.view.subscribe()
    }

    /// Pick the `index`-th suggestion currently shown.
    pub async fn choose(
        &self,
        index: usize,
        store: &SelectionStore,
    ) -> Result<ResolvedLocation, SearchError> {
        let suggestion: Option<LocationSuggestion> =
            self.view.borrow().state.suggestions().get(index).cloned();
        let suggestion = suggestion.ok_or(SearchError::NoResults)?;
        self.resolver.select(&suggestion, store).await
    }

    pub fn resolver(&self) -> &Arc<LocationResolver> {
        &self.resolver
    }

    /// Tear the session down.
    pub fn close(&self) {
        self.task.abort();
        self.debouncer.shutdown();
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.close();
    }
}
