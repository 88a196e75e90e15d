//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Capabilities: one handler per kind of chat request
//! - Messaging: parsing and dispatch
//! - Services: sessions, the conversation log and listing search
//! - Search: keyword extraction and fuzzy ranking
//! - Errors: layer-wide error types

pub mod capabilities;
pub mod errors;
pub mod formatter;
pub mod messaging;
pub mod search;
pub mod services;
