use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::errors::StorageError;
use crate::domain::entities::{
    CbdLocation, ChatSession, ConversationState, ListingFilter, ListingStats, Property,
    StoredMessage, TypeStats,
};

/// Store trait - persistence for sessions, the message log and conversation state
#[async_trait]
pub trait ChatStore: Send + Sync {
    // Session operations
    async fn insert_session(&self, session: &ChatSession) -> Result<(), StorageError>;
    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, StorageError>;
    async fn update_session(&self, session: &ChatSession) -> Result<(), StorageError>;
    /// Most recently updated first
    async fn list_sessions(&self, user_id: Option<i64>, limit: usize) -> Result<Vec<ChatSession>, StorageError>;
    async fn delete_session(&self, id: &str) -> Result<bool, StorageError>;
    async fn sessions_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StorageError>;
    async fn users_with_sessions(&self) -> Result<Vec<i64>, StorageError>;

    // Message operations
    async fn save_message(&self, message: &StoredMessage) -> Result<(), StorageError>;
    /// Oldest first; `limit` keeps the most recent entries
    async fn get_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<StoredMessage>, StorageError>;

    // Conversation state
    async fn get_state(&self, session_id: &str) -> Result<Option<ConversationState>, StorageError>;
    async fn save_state(&self, state: &ConversationState) -> Result<(), StorageError>;
}

/// Read access to listings, CBDs and amenities
#[async_trait]
pub trait ListingStore: Send + Sync {
    async fn get_property(&self, id: i64) -> Result<Option<Property>, StorageError>;
    async fn find_property_by_title(&self, title: &str) -> Result<Option<Property>, StorageError>;
    /// Paid listings, newest first
    async fn search(&self, filter: &ListingFilter) -> Result<Vec<Property>, StorageError>;
    /// Paid listings within `radius_km`, nearest first, with their distance
    async fn nearby(&self, latitude: f64, longitude: f64, radius_km: f64, limit: usize) -> Result<Vec<(Property, f64)>, StorageError>;
    async fn featured(&self, limit: usize) -> Result<Vec<Property>, StorageError>;
    async fn images_for(&self, property_id: i64) -> Result<Vec<String>, StorageError>;
    async fn amenities_for(&self, property_id: i64) -> Result<Vec<String>, StorageError>;
    async fn list_amenities(&self) -> Result<Vec<String>, StorageError>;
    async fn cbds_in_city(&self, city: &str) -> Result<Vec<CbdLocation>, StorageError>;
    async fn get_cbd(&self, id: i64) -> Result<Option<CbdLocation>, StorageError>;
    async fn stats(&self) -> Result<ListingStats, StorageError>;
    async fn type_stats(&self, property_type: &str) -> Result<TypeStats, StorageError>;
}
