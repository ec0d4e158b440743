//! Simulated Map Viewport
//!
//! Implements MapViewport in-process. It keeps a transform, notifies
//! listeners synchronously on every change, and is what the terminal
//! harness and the tests drive instead of a real mapping SDK.

use crate::domain::entities::ResolvedLocation;
use crate::domain::ports::{ListenerId, MapViewport, ViewportListener};
use crate::domain::services::projection::{unproject, ScreenPoint, ViewportTransform};
use crate::domain::value_objects::Coordinates;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// In-process map viewport.
pub struct SimulatedViewport {
    transform: RwLock<ViewportTransform>,
    ready: AtomicBool,
    listeners: DashMap<ListenerId, ViewportListener>,
    next_id: AtomicU64,
}

impl SimulatedViewport {
    /// Create a viewport that is not ready yet.
    pub fn new(transform: ViewportTransform) -> Self {
        Self {
            transform: RwLock::new(transform),
            ready: AtomicBool::new(false),
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create a viewport that has already finished loading.
    pub fn ready(transform: ViewportTransform) -> Self {
        let viewport = Self::new(transform);
        viewport.set_ready(true);
        viewport
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Tear the viewport down: drops every listener and marks it not ready.
    pub fn destroy(&self) {
        self.set_ready(false);
        self.listeners.clear();
        tracing::debug!("viewport destroyed");
    }

    /// Apply a change and notify listeners with the new transform.
    pub fn update(&self, f: impl FnOnce(&mut ViewportTransform)) {
        let snapshot = {
            let mut guard = self.transform.write();
            f(&mut guard);
            *guard
        };
        self.emit(&snapshot);
    }

    pub fn pan_to(&self, center: Coordinates) {
        self.update(|t| t.center = center);
    }

    /// Pan by a screen offset in pixels.
    pub fn pan_by(&self, dx: f64, dy: f64) {
        self.update(|t| {
            let target = ScreenPoint::new(t.width / 2.0 + dx, t.height / 2.0 + dy);
            t.center = unproject(&target, t);
        });
    }

    pub fn zoom_to(&self, zoom: f64) {
        self.update(|t| t.zoom = zoom);
    }

    pub fn rotate_to(&self, bearing: f64) {
        self.update(|t| t.bearing = bearing);
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.update(|t| {
            t.width = width;
            t.height = height;
        });
    }

    /// Listeners run while the listener map is read; they must not add or
    /// remove listeners on this viewport.
    fn emit(&self, transform: &ViewportTransform) {
        for entry in self.listeners.iter() {
            (entry.value())(transform);
        }
    }
}

impl MapViewport for SimulatedViewport {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn transform(&self) -> ViewportTransform {
        *self.transform.read()
    }

    fn add_change_listener(&self, listener: ViewportListener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.insert(id, listener);
        id
    }

    fn remove_change_listener(&self, id: ListenerId) {
        self.listeners.remove(&id);
    }

    fn has_listener(&self, id: ListenerId) -> bool {
        self.listeners.contains_key(&id)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn fly_to(&self, location: &ResolvedLocation, zoom: f64) {
        tracing::debug!(
            "flying to {} ({}) at zoom {}",
            location.name,
            location.coordinates.to_pair(),
            zoom
        );
        self.update(|t| {
            t.center = location.coordinates;
            t.zoom = zoom;
        });
    }
}
