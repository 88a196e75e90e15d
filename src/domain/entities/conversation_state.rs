use serde::{Deserialize, Serialize};

/// CBD offered to the user while waiting for a choice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CbdSuggestion {
    pub id: i64,
    pub name: String,
    pub city: String,
}

/// Per-session flags for multi-turn location clarification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub waiting_for_location: bool,
    pub waiting_for_cbd_clarification: bool,
    pub pending_search_query: String,
    pub suggested_cbds: Vec<CbdSuggestion>,
    pub selected_cbd: Option<i64>,
}

impl ConversationState {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Default::default()
        }
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.waiting_for_location || self.waiting_for_cbd_clarification
    }

    pub fn reset(&mut self) {
        self.waiting_for_location = false;
        self.waiting_for_cbd_clarification = false;
        self.pending_search_query.clear();
        self.suggested_cbds.clear();
        self.selected_cbd = None;
    }
}
