//! Domain Layer
//!
//! Entities, value objects, ports and pure services for location search.
//! Nothing in here performs I/O.

pub mod entities;
pub mod errors;
pub mod ports;
pub mod services;
pub mod value_objects;
