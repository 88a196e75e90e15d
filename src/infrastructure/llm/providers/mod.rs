//! LLM Providers

pub mod chat_completions;

use std::sync::Arc;

pub use chat_completions::ChatCompletionsProvider;

use super::{LLMConfig, LLMError, LLMProvider, LLMResult, LLM};

/// Build the configured provider, failing when its API key is absent
pub fn build_provider(config: &LLMConfig) -> LLMResult<Arc<dyn LLM>> {
    let key = config
        .api_key(config.provider)
        .filter(|k| !k.is_empty())
        .ok_or(LLMError::MissingApiKey)?;
    let model = Some(config.model(config.provider));

    let provider = match config.provider {
        LLMProvider::Groq => ChatCompletionsProvider::groq(key, model),
        LLMProvider::OpenAI => ChatCompletionsProvider::openai(key, model),
    };
    Ok(Arc::new(provider))
}
