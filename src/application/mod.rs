//! Application Layer
//!
//! Use cases wiring the domain services to the ports.

pub mod location_resolver;
pub mod search_session;

pub use location_resolver::{LocationResolver, ResolveOutcome, ResolverSettings, SearchState};
pub use search_session::{SearchSession, SearchView};
