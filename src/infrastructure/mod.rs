//! Infrastructure Layer
//!
//! Timing and rendering primitives shared by the application layer.

pub mod debounce;
pub mod marker_binder;

pub use debounce::{DebouncedValue, Debouncer};
pub use marker_binder::{BinderError, BinderState, MarkerBinder};
