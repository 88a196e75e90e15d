//! Capabilities - pluggable handlers, each owning one kind of request
//!
//! The dispatcher asks each capability in ascending priority order whether it
//! can handle a message; the first that says yes produces the reply.

pub mod comprehensive;
pub mod conversational;
pub mod database_query;
pub mod location_clarification;
pub mod property_search;
pub mod registry;
pub mod smart_location_search;

use async_trait::async_trait;
use chrono::Utc;

use crate::application::errors::ChatError;
use crate::domain::entities::{ChatSession, ConversationState, Message, Response};

pub use comprehensive::ComprehensiveCapability;
pub use conversational::ConversationalCapability;
pub use database_query::DatabaseQueryCapability;
pub use location_clarification::LocationClarificationCapability;
pub use property_search::PropertySearchCapability;
pub use registry::{default_registry, CapabilityRegistry};
pub use smart_location_search::SmartLocationSearchCapability;

/// Priority given to capabilities that do not override it
pub const DEFAULT_PRIORITY: i32 = 100;

/// Session-scoped data a capability may read and update
#[derive(Debug, Clone)]
pub struct CapabilityContext {
    pub session: ChatSession,
    pub state: ConversationState,
}

impl CapabilityContext {
    pub fn new(session: ChatSession, state: ConversationState) -> Self {
        Self { session, state }
    }
}

#[async_trait]
pub trait Capability: Send + Sync {
    /// Unique name used for registration
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Lower runs first
    fn priority(&self) -> i32 {
        DEFAULT_PRIORITY
    }

    fn can_handle(&self, message: &Message, ctx: &CapabilityContext) -> bool;

    async fn process(&self, message: &Message, ctx: &mut CapabilityContext) -> Result<Response, ChatError>;
}

/// Pick one of several canned replies
pub(crate) fn pick<'a>(options: &[&'a str]) -> &'a str {
    if options.is_empty() {
        return "";
    }
    let n = Utc::now().timestamp_subsec_nanos() as usize;
    options[n % options.len()]
}
