//! Message dispatcher - Routes each message to exactly one capability

use std::sync::Arc;

use serde_json::json;

use super::parser::MessageParser;
use crate::application::capabilities::{Capability, CapabilityContext, CapabilityRegistry};
use crate::application::errors::ChatError;
use crate::application::formatter::format_for_storage;
use crate::application::services::ChatService;
use crate::domain::entities::{ChatSession, ConversationState, Message, Response, Sender};

pub const NO_CAPABILITY_REPLY: &str = "I'm not sure how to help with that. Could you try rephrasing your question?";
pub const FAILURE_REPLY: &str = "Something went wrong. Please try again.";

/// Reply to one message, with the session it was recorded in
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub session_id: String,
    pub response: Response,
}

pub struct Dispatcher {
    capabilities: Vec<Arc<dyn Capability>>,
    chat: Arc<ChatService>,
    parser: MessageParser,
}

impl Dispatcher {
    /// Snapshot the registry in evaluation order
    pub fn new(registry: &CapabilityRegistry, chat: Arc<ChatService>) -> Self {
        Self {
            capabilities: registry.ordered(),
            chat,
            parser: MessageParser::default(),
        }
    }

    pub fn with_parser(mut self, parser: MessageParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn capability_names(&self) -> Vec<&str> {
        self.capabilities.iter().map(|c| c.name()).collect()
    }

    pub fn chat(&self) -> &Arc<ChatService> {
        &self.chat
    }

    /// Handle one chat message end to end.
    ///
    /// Only invalid input is returned as an error; capability failures become
    /// error responses and persistence failures are logged.
    pub async fn process(
        &self,
        content: &str,
        session_id: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<DispatchOutcome, ChatError> {
        let message = self.parser.parse(content, user_id)?;

        let mut session = match self.chat.get_or_create_session(session_id, user_id).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!("Could not load session: {}", e);
                ChatSession::new(uuid::Uuid::new_v4().to_string(), user_id)
            }
        };
        let state = match self.chat.load_state(&session.id).await {
            Ok(state) => state,
            Err(e) => {
                tracing::error!("Could not load conversation state: {}", e);
                ConversationState::new(session.id.clone())
            }
        };
        let message = message.with_session(session.id.clone());

        let initial_state = state.clone();
        let mut ctx = CapabilityContext::new(session.clone(), state);
        let response = self.dispatch(&message, &mut ctx).await;

        self.persist(&mut session, &message, &response).await;
        if ctx.state != initial_state {
            if let Err(e) = self.chat.save_state(&ctx.state).await {
                tracing::error!("Could not save conversation state: {}", e);
            }
        }

        Ok(DispatchOutcome {
            session_id: session.id,
            response,
        })
    }

    async fn dispatch(&self, message: &Message, ctx: &mut CapabilityContext) -> Response {
        let view: &CapabilityContext = ctx;
        let Some(capability) = self.capabilities.iter().find(|c| c.can_handle(message, view)) else {
            tracing::warn!("No capability found for: {}", message.content);
            return Response::error(NO_CAPABILITY_REPLY, "No capability found");
        };

        tracing::info!(capability = capability.name(), session = ?message.session_id, "Processing message");
        match capability.process(message, ctx).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Capability {} failed: {}", capability.name(), e);
                Response::error(FAILURE_REPLY, e.to_string())
            }
        }
    }

    async fn persist(&self, session: &mut ChatSession, message: &Message, response: &Response) {
        if let Err(e) = self
            .chat
            .record_message(session, Sender::User, &message.content, "text", json!({}))
            .await
        {
            tracing::error!("Could not save user message: {}", e);
        }

        if let Err(e) = self
            .chat
            .record_message(
                session,
                Sender::Bot,
                &response.content,
                response.message_type.as_str(),
                format_for_storage(response),
            )
            .await
        {
            tracing::error!("Could not save bot response: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SessionSettings;
    use crate::domain::entities::MessageType;
    use crate::infrastructure::database::Database;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl Capability for Failing {
        fn name(&self) -> &str {
            "Failing"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn can_handle(&self, message: &Message, _ctx: &CapabilityContext) -> bool {
            message.content.contains("fail")
        }

        async fn process(&self, _message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
            Err(ChatError::Internal("boom".to_string()))
        }
    }

    fn dispatcher() -> Dispatcher {
        let chat = Arc::new(ChatService::new(Arc::new(Database::in_memory().unwrap()), SessionSettings::default()));
        let mut registry = CapabilityRegistry::new();
        registry.register(Arc::new(Failing));
        Dispatcher::new(&registry, chat)
    }

    #[tokio::test]
    async fn test_capability_error_becomes_error_response() {
        let dispatcher = dispatcher();
        let outcome = dispatcher.process("please fail", None, None).await.unwrap();
        assert_eq!(outcome.response.message_type, MessageType::Error);
        assert_eq!(outcome.response.content, FAILURE_REPLY);
        assert_eq!(outcome.response.error_message.as_deref(), Some("Internal error: boom"));

        let history = dispatcher.chat().history(&outcome.session_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].metadata["error_type"], "processing_error");
    }

    #[tokio::test]
    async fn test_no_capability() {
        let outcome = dispatcher().process("hello", None, None).await.unwrap();
        assert_eq!(outcome.response.content, NO_CAPABILITY_REPLY);
        assert_eq!(outcome.response.error_message.as_deref(), Some("No capability found"));
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        assert!(matches!(dispatcher().process("  ", None, None).await, Err(ChatError::InvalidInput(_))));
    }
}
