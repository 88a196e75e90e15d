//! Catch-all: answer anything else straight from the database

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::{Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::services::ListingService;
use crate::domain::entities::{Message, MessageType, Response};
use crate::infrastructure::nlsql::SUMMARY_FALLBACK;

const NO_ROWS: &str = "I found some information, but it might not be exactly what you're looking for. \
Could you try rephrasing your question?";

const QUERY_FAILED: &str = "I encountered an error while processing your request. Please try again.";

pub struct DatabaseQueryCapability {
    listings: Arc<ListingService>,
}

impl DatabaseQueryCapability {
    pub fn new(listings: Arc<ListingService>) -> Self {
        Self { listings }
    }
}

#[async_trait]
impl Capability for DatabaseQueryCapability {
    fn name(&self) -> &str {
        "DatabaseQuery"
    }

    fn description(&self) -> &str {
        "Answers general questions by querying the listing database"
    }

    fn can_handle(&self, _message: &Message, _ctx: &CapabilityContext) -> bool {
        true
    }

    async fn process(&self, message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let result = match self.listings.query(&message.content).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("Database query failed: {}", e);
                return Ok(Response::error(QUERY_FAILED, e.to_string()));
            }
        };

        let content = if result.is_empty() {
            NO_ROWS.to_string()
        } else {
            result.chat_response.clone().unwrap_or_else(|| SUMMARY_FALLBACK.to_string())
        };
        let rows = result.rows.into_iter().map(Value::Object).collect();

        Ok(Response::new(content, MessageType::DatabaseQuery)
            .with_properties(rows)
            .with_metadata("sql_query", result.sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SearchSettings;
    use crate::domain::entities::{ChatSession, ConversationState};
    use crate::infrastructure::database::Database;
    use crate::infrastructure::nlsql::DisabledQueryEngine;

    #[tokio::test]
    async fn test_engine_failure_becomes_error_response() {
        let service = ListingService::new(
            Arc::new(Database::in_memory().unwrap()),
            Arc::new(DisabledQueryEngine::new("no key")),
            SearchSettings::default(),
        );
        let cap = DatabaseQueryCapability::new(Arc::new(service));
        let mut ctx = CapabilityContext::new(ChatSession::new("s1", None), ConversationState::new("s1"));

        assert!(cap.can_handle(&Message::new("anything at all"), &ctx));
        let reply = cap.process(&Message::new("anything at all"), &mut ctx).await.unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert_eq!(reply.content, QUERY_FAILED);
        assert!(reply.error_message.unwrap().contains("no key"));
    }
}
