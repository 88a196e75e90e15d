use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Classification attached to messages and responses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Conversational,
    PropertySearch,
    DatabaseQuery,
    Help,
    Greeting,
    Farewell,
    Gratitude,
    Error,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::Conversational => "conversational",
            MessageType::PropertySearch => "property_search",
            MessageType::DatabaseQuery => "database_query",
            MessageType::Help => "help",
            MessageType::Greeting => "greeting",
            MessageType::Farewell => "farewell",
            MessageType::Gratitude => "gratitude",
            MessageType::Error => "error",
        }
    }

    /// Small-talk kinds rendered without a result list
    pub fn is_conversational(&self) -> bool {
        matches!(
            self,
            MessageType::Conversational
                | MessageType::Help
                | MessageType::Greeting
                | MessageType::Farewell
                | MessageType::Gratitude
        )
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An incoming chat message
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub content: String,
    pub message_type: MessageType,
    pub metadata: Map<String, Value>,
    pub session_id: Option<String>,
    pub user_id: Option<i64>,
}

impl Message {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Conversational,
            metadata: Map::new(),
            session_id: None,
            user_id: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Lower-cased, trimmed content used by every matcher
    pub fn normalized(&self) -> String {
        self.content.trim().to_lowercase()
    }
}
