//! Application services - Business logic orchestration

pub mod chat_service;
pub mod listing_service;

pub use chat_service::{ChatService, LimitReport, SessionSettings};
pub use listing_service::{ListingService, SearchSettings};
