//! Selection Store
//!
//! Holds the single active location selection shared between the search
//! box, the map and the rate comparison views.

use crate::domain::entities::{ResolvedLocation, SelectedLocation, SelectionData};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;

struct Inner {
    slot: RwLock<Option<SelectedLocation>>,
    changes: watch::Sender<Option<SelectedLocation>>,
}

/// Shared selection slot.
///
/// Cloning yields another handle to the same slot. The `(value, data)` pair
/// is written as one unit, so readers never observe a value without its
/// data or the other way around.
#[derive(Clone)]
pub struct SelectionStore {
    inner: Arc<Inner>,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(None);
        Self {
            inner: Arc::new(Inner {
                slot: RwLock::new(None),
                changes,
            }),
        }
    }

    /// Replace the selection. Returns the previous one.
    pub fn select(&self, value: impl Into<String>, data: SelectionData) -> Option<SelectedLocation> {
        self.replace(Some(SelectedLocation {
            value: value.into(),
            data,
        }))
    }

    /// Select a resolved location, using its slug as the value.
    pub fn select_location(&self, location: &ResolvedLocation) -> SelectedLocation {
        let selected = SelectedLocation::from(location);
        self.replace(Some(selected.clone()));
        selected
    }

    /// Reset value and data together.
    pub fn clear(&self) -> Option<SelectedLocation> {
        self.replace(None)
    }

    pub fn get(&self) -> Option<SelectedLocation> {
        self.inner.slot.read().clone()
    }

    pub fn value(&self) -> Option<String> {
        self.inner.slot.read().as_ref().map(|s| s.value.clone())
    }

    /// Receive every selection change.
    pub fn subscribe(&self) -> watch::Receiver<Option<SelectedLocation>> {
        self.inner.changes.subscribe()
    }

    /// Subscribe to a projection of the selection. The returned handle only
    /// wakes when the projected value changes.
    pub fn select_with<R, F>(&self, selector: F) -> Selector<R, F>
    where
        R: PartialEq + Clone,
        F: Fn(Option<&SelectedLocation>) -> R,
    {
        let rx = self.subscribe();
        let last = selector(rx.borrow().as_ref());
        Selector { rx, selector, last }
    }

    fn replace(&self, next: Option<SelectedLocation>) -> Option<SelectedLocation> {
        let mut slot = self.inner.slot.write();
        let previous = std::mem::replace(&mut *slot, next.clone());
        if previous != next {
            self.inner.changes.send_replace(next);
        }
        previous
    }
}

/// Projected view of the selection returned by [`SelectionStore::select_with`].
pub struct Selector<R, F> {
    rx: watch::Receiver<Option<SelectedLocation>>,
    selector: F,
    last: R,
}

impl<R, F> Selector<R, F>
where
    R: PartialEq + Clone,
    F: Fn(Option<&SelectedLocation>) -> R,
{
    /// Last projected value seen by this selector.
    pub fn get(&self) -> R {
        self.last.clone()
    }

    /// Wait until the projected value differs from the last one seen.
    /// Returns `None` once the store is gone.
    pub async fn changed(&mut self) -> Option<R> {
        loop {
            self.rx.changed().await.ok()?;
            let next = (self.selector)(self.rx.borrow_and_update().as_ref());
            if next != self.last {
                self.last = next.clone();
                return Some(next);
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::domain::value_objects::Coordinates;

    fn casablanca() -> ResolvedLocation {
        ResolvedLocation {
            id: "ma-casablanca".to_string(),
            name: "Casablanca".to_string(),
            place_formatted: "Casablanca-Settat, Morocco".to_string(),
            coordinates: Coordinates::new(-7.5898, 33.5731),
        }
    }

    // ===== Slot Tests =====

    #[test]
    fn test_starts_empty() {
        let store = SelectionStore::new();
        assert!(store.get().is_none());
        assert!(store.value().is_none());
    }

    #[test]
    fn test_select_sets_value_and_data() {
        let store = SelectionStore::new();

        let previous = store.select("casablanca", SelectionData::labelled("Casablanca"));

        assert!(previous.is_none());
        let selected = store.get().unwrap();
        assert_eq!(selected.value, "casablanca");
        assert_eq!(selected.data.label, "Casablanca");
    }

    #[test]
    fn test_select_location_uses_slug() {
        let store = SelectionStore::new();

        let selected = store.select_location(&casablanca());

        assert_eq!(selected.value, "casablanca");
        assert_eq!(selected.data.label, "Casablanca");
        assert_eq!(selected.data.coordinates, Some(casablanca().coordinates));
        assert_eq!(store.get(), Some(selected));
    }

    #[test]
    fn test_clear_resets_both() {
        let store = SelectionStore::new();
        store.select("rabat", SelectionData::labelled("Rabat"));

        let previous = store.clear();

        assert_eq!(previous.unwrap().value, "rabat");
        assert!(store.get().is_none());
    }

    #[test]
    fn test_clones_share_slot() {
        let store = SelectionStore::new();
        let other = store.clone();

        other.select("fes", SelectionData::labelled("Fès"));

        assert_eq!(store.value().as_deref(), Some("fes"));
    }

    // ===== Subscription Tests =====

    #[tokio::test]
    async fn test_subscribe_sees_each_change() {
        let store = SelectionStore::new();
        let mut rx = store.subscribe();

        store.select("rabat", SelectionData::labelled("Rabat"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_ref().unwrap().value, "rabat");

        store.clear();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_identical_select_does_not_notify() {
        let store = SelectionStore::new();
        store.select("rabat", SelectionData::labelled("Rabat"));
        let rx = store.subscribe();

        store.select("rabat", SelectionData::labelled("Rabat"));

        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_selector_wakes_only_on_projected_change() {
        let store = SelectionStore::new();
        let mut labels = store.select_with(|s| s.map(|s| s.data.label.clone()));
        assert_eq!(labels.get(), None);

        store.select("casa", SelectionData::labelled("Casablanca"));
        assert_eq!(labels.changed().await, Some(Some("Casablanca".to_string())));

        store.select_location(&casablanca());
        store.select("rabat", SelectionData::labelled("Rabat"));
        assert_eq!(labels.changed().await, Some(Some("Rabat".to_string())));

        // Same label, different data: no wake-up
        store.select(
            "rabat-city",
            SelectionData {
                label: "Rabat".to_string(),
                coordinates: None,
                place_formatted: Some("Morocco".to_string()),
            },
        );
        let mut pending = tokio_test::task::spawn(labels.changed());
        tokio_test::assert_pending!(pending.poll());
    }

    #[tokio::test]
    async fn test_selector_ends_with_store() {
        let store = SelectionStore::new();
        let mut selector = store.select_with(|s| s.is_some());

        drop(store);

        assert_eq!(selector.changed().await, None);
    }
}
