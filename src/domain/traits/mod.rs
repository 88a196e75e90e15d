//! Domain traits - Abstractions for infrastructure implementations

pub mod store;
pub mod query_engine;

pub use store::{ChatStore, ListingStore};
pub use query_engine::QueryEngine;
