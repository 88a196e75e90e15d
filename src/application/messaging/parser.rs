//! Message parser - Turns raw chat input into structured messages

use crate::application::errors::ChatError;
use crate::domain::entities::Message;

/// Upper bound on a single chat message, in characters
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Parses incoming text into Message objects
pub struct MessageParser {
    max_chars: usize,
}

impl MessageParser {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// Collapse whitespace and attach the sending user
    pub fn parse(&self, text: &str, user_id: Option<i64>) -> Result<Message, ChatError> {
        let content = text.split_whitespace().collect::<Vec<_>>().join(" ");

        if content.is_empty() {
            return Err(ChatError::InvalidInput("message is empty".to_string()));
        }
        if content.chars().count() > self.max_chars {
            return Err(ChatError::InvalidInput(format!(
                "message is longer than {} characters",
                self.max_chars
            )));
        }

        Ok(Message::new(content).with_user(user_id))
    }
}

impl Default for MessageParser {
    fn default() -> Self {
        Self::new(MAX_MESSAGE_CHARS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_whitespace() {
        let message = MessageParser::default().parse("  houses \n in   Harare ", Some(4)).unwrap();
        assert_eq!(message.content, "houses in Harare");
        assert!(message.session_id.is_none());
        assert_eq!(message.user_id, Some(4));
    }

    #[test]
    fn test_parse_rejects_empty_and_oversized() {
        let parser = MessageParser::new(10);
        assert!(matches!(parser.parse("   ", None), Err(ChatError::InvalidInput(_))));
        assert!(matches!(parser.parse("a very long message", None), Err(ChatError::InvalidInput(_))));
    }
}
