mod location_merger;
pub mod projection;

pub use location_merger::{normalize_name, LocationMerger};
pub use projection::{project, unproject, ScreenPoint, ViewportTransform};
