//! Domain entities - Core business objects

pub mod message;
pub mod response;
pub mod session;
pub mod conversation_state;
pub mod listing;
pub mod query;

pub use message::{Message, MessageType};
pub use response::{Response, ResponseData};
pub use session::{ChatSession, Sender, StoredMessage};
pub use conversation_state::{CbdSuggestion, ConversationState};
pub use listing::{
    CbdLocation, ListingFilter, ListingStats, ListingType, Property, PropertySummary, TypeStats,
};
pub use query::{NlQueryResult, SearchFilters};
