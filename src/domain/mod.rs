//! Domain layer - Core business objects
//!
//! This layer contains:
//! - Entities: messages, responses, sessions, conversation state, listings
//! - Traits: Abstractions for infrastructure (stores, query engine)

pub mod entities;
pub mod traits;
