//! Map Viewport Port
//!
//! Defines the interface to the map surface markers are drawn on.

use crate::domain::entities::ResolvedLocation;
use crate::domain::services::projection::ViewportTransform;

/// Handle returned when registering a change listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Callback invoked with the new transform after every pan, zoom or rotate.
pub type ViewportListener = Box<dyn Fn(&ViewportTransform) + Send + Sync>;

/// A map viewport.
///
/// This is an outbound port over the mapping SDK. Listeners are called
/// synchronously from the change notification, before the next frame.
pub trait MapViewport: Send + Sync {
    /// Whether the viewport has finished loading.
    fn is_ready(&self) -> bool;

    /// Current pan/zoom/rotation state.
    fn transform(&self) -> ViewportTransform;

    /// Viewport size in pixels.
    fn size(&self) -> (f64, f64) {
        let t = self.transform();
        (t.width, t.height)
    }

    /// Register a change listener.
    fn add_change_listener(&self, listener: ViewportListener) -> ListenerId;

    /// Remove a change listener. Unknown ids are ignored.
    fn remove_change_listener(&self, id: ListenerId);

    /// Whether a listener is still registered. A destroyed viewport drops
    /// every listener, so this turns false on teardown.
    fn has_listener(&self, id: ListenerId) -> bool;

    /// Number of registered change listeners.
    fn listener_count(&self) -> usize;

    /// Move the viewport to a location.
    fn fly_to(&self, location: &ResolvedLocation, zoom: f64);
}
