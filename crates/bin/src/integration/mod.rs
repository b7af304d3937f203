//! Drivers wiring the library crates to the command line surface.

pub(crate) mod ingest;
pub(crate) mod store_manager;
pub(crate) mod transform;
