//! Small talk: greetings, farewells, thanks and "what can you do"

use async_trait::async_trait;

use super::{pick, Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::search::contains_any;
use crate::application::search::query_parser::mentions_property;
use crate::domain::entities::{Message, MessageType, Response};

const GREETINGS: &[&str] = &[
    "hello", "hi", "hey", "hie", "good morning", "good afternoon", "good evening",
    "how are you", "how's it going", "what's up", "sup", "yo",
];

const FAREWELLS: &[&str] = &["bye", "goodbye", "see you", "take care", "have a good day"];

const GRATITUDE: &[&str] = &[
    "thanks", "thank you", "appreciate it", "awesome", "great", "perfect", "excellent",
];

const HELP_QUERIES: &[&str] = &[
    "how does this work", "what can you do", "help", "what are you", "who are you",
];

const GREETING_REPLIES: &[&str] = &[
    "Hello! 👋 I'm here to help you find your perfect property in Zimbabwe. What are you looking for today?",
    "Hi there! 😊 Welcome to Tourwise! I can help you find houses, apartments, and other properties. What's on your mind?",
    "Hey! 🏡 Great to see you! I'm your property search assistant. What type of property are you interested in?",
    "Good day! ✨ I'm here to make your property search easy and fun. What can I help you find today?",
    "Hello! 🌟 Welcome to Tourwise! I'm excited to help you discover amazing properties. What are you searching for?",
];

const FAREWELL_REPLIES: &[&str] = &[
    "Goodbye! 👋 It was great helping you today. Feel free to come back anytime!",
    "Take care! 😊 Happy house hunting! Don't hesitate to return if you need more help.",
    "See you later! 🏡 I hope you found what you were looking for. Come back soon!",
    "Have a wonderful day! ✨ Thanks for using Tourwise. I'll be here when you need me!",
    "Bye for now! 🌟 Good luck with your property search. I'm always here to help!",
];

const GRATITUDE_REPLIES: &[&str] = &[
    "You're very welcome! 😊 I'm glad I could help. Is there anything else you'd like to know?",
    "My pleasure! ✨ I love helping people find their perfect home. What else can I assist you with?",
    "Anytime! 🏡 I'm here to make your property search as smooth as possible. Need anything else?",
    "Happy to help! 🌟 That's what I'm here for. Feel free to ask me anything about properties!",
    "You're welcome! 😄 I enjoy helping people discover great properties. What's next on your list?",
];

const HELP_REPLY: &str = "I'm your AI property assistant! 🏡 I can help you find houses, apartments, and other \
properties in Zimbabwe. Just tell me what you're looking for - like 'houses in Harare' or 'apartments under $500' - \
and I'll search our database for you. What type of property interests you?";

const FALLBACK_REPLY: &str = "I'm here to help you find properties! What are you looking for?";

pub struct ConversationalCapability;

impl ConversationalCapability {
    pub fn new() -> Self {
        Self
    }

    fn classify(text: &str) -> Option<MessageType> {
        if contains_any(text, GREETINGS) {
            Some(MessageType::Greeting)
        } else if contains_any(text, FAREWELLS) {
            Some(MessageType::Farewell)
        } else if contains_any(text, GRATITUDE) {
            Some(MessageType::Gratitude)
        } else if contains_any(text, HELP_QUERIES) {
            Some(MessageType::Help)
        } else {
            None
        }
    }
}

impl Default for ConversationalCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Capability for ConversationalCapability {
    fn name(&self) -> &str {
        "Conversational"
    }

    fn description(&self) -> &str {
        "Handles greetings, farewells, gratitude, and help queries"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn can_handle(&self, message: &Message, _ctx: &CapabilityContext) -> bool {
        let text = message.normalized();
        Self::classify(&text).is_some() && !mentions_property(&text)
    }

    async fn process(&self, message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let kind = Self::classify(&message.normalized()).unwrap_or(MessageType::Conversational);

        let content = match kind {
            MessageType::Greeting => pick(GREETING_REPLIES),
            MessageType::Farewell => pick(FAREWELL_REPLIES),
            MessageType::Gratitude => pick(GRATITUDE_REPLIES),
            MessageType::Help => HELP_REPLY,
            _ => FALLBACK_REPLY,
        };

        Ok(Response::new(content, kind).with_metadata("is_conversational", true))
    }
}
