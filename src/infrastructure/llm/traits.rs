//! LLM traits - the completion interface the query engine talks to

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One prompt turn sent to the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMMessage {
    pub role: Role,
    pub content: String,
}

impl LLMMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// LLM response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMResponse {
    pub content: String,
    pub model: String,
    pub usage: Option<LLMUsage>,
    pub finish_reason: Option<String>,
}

impl LLMResponse {
    /// The model stopped at the token limit, so generated SQL may be cut off
    pub fn truncated(&self) -> bool {
        self.finish_reason.as_deref() == Some("length")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LLMUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// LLM errors
#[derive(Error, Debug)]
pub enum LLMError {
    #[error("Missing API key")]
    MissingApiKey,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Provider returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

pub type LLMResult<T> = Result<T, LLMError>;

/// Chat-completion provider
#[async_trait]
pub trait LLM: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// `model` overrides the provider default
    async fn chat(
        &self,
        messages: Vec<LLMMessage>,
        model: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> LLMResult<LLMResponse>;
}
