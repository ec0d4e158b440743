//! Map Marker Binder
//!
//! Keeps an overlay marker pinned to a geographic coordinate while the
//! viewport pans, zooms and rotates.

use crate::domain::entities::ResolvedLocation;
use crate::domain::ports::{ListenerId, MapViewport};
use crate::domain::services::projection::{project, ScreenPoint};
use crate::domain::value_objects::Coordinates;
use parking_lot::RwLock;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BinderError {
    #[error("map viewport is not ready")]
    ViewportNotReady,

    #[error("marker is already attached")]
    AlreadyAttached,
}

/// Binder lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinderState {
    /// No listener registered, no screen position
    Detached,
    /// Listening for viewport changes
    Attached,
}

impl std::fmt::Display for BinderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinderState::Detached => write!(f, "detached"),
            BinderState::Attached => write!(f, "attached"),
        }
    }
}

/// Binds one marker to one viewport.
///
/// Only resolved locations can be bound, so a marker is never drawn at a
/// placeholder coordinate. While attached, every viewport change event
/// recomputes the screen position synchronously, before the listener
/// returns. Destroying the viewport drops the listener, which moves the
/// binder back to Detached.
pub struct MarkerBinder {
    viewport: Arc<dyn MapViewport>,
    target: Arc<RwLock<Coordinates>>,
    position: Arc<RwLock<Option<ScreenPoint>>>,
    listener: Option<ListenerId>,
    label: String,
}

impl MarkerBinder {
    pub fn new(viewport: Arc<dyn MapViewport>, location: &ResolvedLocation) -> Self {
        Self {
            viewport,
            target: Arc::new(RwLock::new(location.coordinates)),
            position: Arc::new(RwLock::new(None)),
            listener: None,
            label: location.name.clone(),
        }
    }

    /// Register with the viewport and compute the initial position.
    pub fn attach(&mut self) -> Result<ScreenPoint, BinderError> {
        if self.live_listener().is_some() {
            return Err(BinderError::AlreadyAttached);
        }
        self.forget_dead_listener();
        if !self.viewport.is_ready() {
            return Err(BinderError::ViewportNotReady);
        }

        let initial = project(&self.target.read(), &self.viewport.transform());
        *self.position.write() = Some(initial);

        let target = Arc::clone(&self.target);
        let position = Arc::clone(&self.position);
        let id = self.viewport.add_change_listener(Box::new(move |transform| {
            let point = project(&target.read(), transform);
            *position.write() = Some(point);
        }));
        self.listener = Some(id);

        tracing::debug!("marker {} attached ({:?})", self.label, id);
        Ok(initial)
    }

    /// The listener id, if the viewport still holds it.
    fn live_listener(&self) -> Option<ListenerId> {
        self.listener.filter(|id| self.viewport.has_listener(*id))
    }

    /// Drop a listener id the viewport no longer knows about.
    fn forget_dead_listener(&mut self) {
        if let Some(id) = self.listener {
            if !self.viewport.has_listener(id) {
                self.listener = None;
                *self.position.write() = None;
                tracing::debug!("marker {} lost its viewport ({:?})", self.label, id);
            }
        }
    }

    /// Remove the change listener. Detaching a detached binder is a no-op.
    pub fn detach(&mut self) {
        if let Some(id) = self.listener.take() {
            self.viewport.remove_change_listener(id);
            *self.position.write() = None;
            tracing::debug!("marker {} detached ({:?})", self.label, id);
        }
    }

    /// Re-pin the marker to another location, keeping the listener.
    pub fn move_to(&mut self, location: &ResolvedLocation) {
        *self.target.write() = location.coordinates;
        self.label = location.name.clone();
        self.forget_dead_listener();
        if self.listener.is_some() {
            let point = project(&location.coordinates, &self.viewport.transform());
            *self.position.write() = Some(point);
        }
    }

    pub fn state(&self) -> BinderState {
        if self.live_listener().is_some() {
            BinderState::Attached
        } else {
            BinderState::Detached
        }
    }

    pub fn is_attached(&self) -> bool {
        self.live_listener().is_some()
    }

    /// Current screen position; `None` while detached.
    pub fn position(&self) -> Option<ScreenPoint> {
        self.live_listener().and(*self.position.read())
    }

    pub fn coordinates(&self) -> Coordinates {
        *self.target.read()
    }
}

impl Drop for MarkerBinder {
    fn drop(&mut self) {
        self.detach();
    }
}
