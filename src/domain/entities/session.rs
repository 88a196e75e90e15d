use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const TITLE_LENGTH: usize = 50;

/// A chat session grouping messages and conversation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    pub id: String,
    pub user_id: Option<i64>,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub has_ai_response: bool,
}

impl ChatSession {
    pub fn new(id: impl Into<String>, user_id: Option<i64>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id,
            title: None,
            created_at: now,
            updated_at: now,
            is_active: true,
            has_ai_response: false,
        }
    }

    pub fn is_expired(&self, ttl: Duration) -> bool {
        Utc::now() - self.created_at > ttl
    }

    /// Title derived from the first user message
    pub fn title_from(content: &str) -> String {
        let mut title: String = content.chars().take(TITLE_LENGTH).collect();
        if content.chars().count() > TITLE_LENGTH {
            title.push_str("...");
        }
        title
    }
}

/// Who wrote a stored message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Bot => "bot",
            Sender::System => "system",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Sender::User),
            "bot" => Some(Sender::Bot),
            "system" => Some(Sender::System),
            _ => None,
        }
    }
}

/// One entry of the persisted conversation log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub id: String,
    pub session_id: String,
    pub sender: Sender,
    pub content: String,
    pub message_type: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl StoredMessage {
    pub fn new(
        session_id: impl Into<String>,
        sender: Sender,
        content: impl Into<String>,
        message_type: impl Into<String>,
        metadata: Value,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: session_id.into(),
            sender,
            content: content.into(),
            message_type: message_type.into(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_truncates_long_messages() {
        let long = "a".repeat(60);
        let title = ChatSession::title_from(&long);
        assert_eq!(title.len(), 53);
        assert!(title.ends_with("..."));

        assert_eq!(ChatSession::title_from("houses in Harare"), "houses in Harare");
    }

    #[test]
    fn test_expiry() {
        let mut session = ChatSession::new("s1", None);
        assert!(!session.is_expired(Duration::hours(24)));
        session.created_at = Utc::now() - Duration::hours(25);
        assert!(session.is_expired(Duration::hours(24)));
    }
}
