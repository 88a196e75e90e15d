//! OpenAI-compatible chat completions client (Groq, OpenAI)

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::infrastructure::llm::{LLMError, LLMMessage, LLMResponse, LLMResult, LLMUsage, LLM};

/// Groq API endpoint
pub const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
/// OpenAI API endpoint
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Provider speaking the `/chat/completions` protocol
pub struct ChatCompletionsProvider {
    name: String,
    api_base: String,
    api_key: String,
    client: Client,
    model: String,
}

impl ChatCompletionsProvider {
    pub fn new(
        name: impl Into<String>,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            client: Client::new(),
            model: model.into(),
        }
    }

    pub fn groq(api_key: impl Into<String>, model: Option<&str>) -> Self {
        Self::new("groq", GROQ_API_BASE, api_key, model.unwrap_or("llama3-8b-8192"))
    }

    pub fn openai(api_key: impl Into<String>, model: Option<&str>) -> Self {
        Self::new("openai", OPENAI_API_BASE, api_key, model.unwrap_or("gpt-4"))
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL for API
    fn base_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// API request structure
#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<LLMMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// API response structure
#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

/// Choice in response
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

/// Response message
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Usage information
#[derive(Deserialize, Debug)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

#[async_trait]
impl LLM for ChatCompletionsProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(
        &self,
        messages: Vec<LLMMessage>,
        model: Option<&str>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> LLMResult<LLMResponse> {
        if self.api_key.is_empty() {
            return Err(LLMError::MissingApiKey);
        }

        let model = model.unwrap_or(&self.model);

        let request = ChatRequest {
            model: model.to_string(),
            messages,
            temperature,
            max_tokens,
            stream: false,
        };

        tracing::debug!(provider = %self.name, model = %model, "chat completion request");

        let response = self.client
            .post(self.base_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| LLMError::Request(e.to_string()))?;

        if response.status() == 429 {
            return Err(LLMError::RateLimited);
        }

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LLMError::Api { status, body });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::InvalidResponse(e.to_string()))?;

        let choice = chat_response.choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::InvalidResponse("No choices in response".to_string()))?;

        let usage = chat_response.usage.map(|u| LLMUsage {
            prompt_tokens: u.prompt_tokens,
            completion_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        Ok(LLMResponse {
            content: choice.message.content.unwrap_or_default(),
            model: model.to_string(),
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}
