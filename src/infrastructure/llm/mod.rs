//! LLM integration - OpenAI-compatible providers

pub mod traits;
pub mod config;
pub mod providers;

#[cfg(test)]
mod tests;

pub use traits::{LLMError, LLMMessage, LLMResponse, LLMResult, LLMUsage, Role, LLM};
pub use config::{LLMConfig, LLMProvider};
pub use providers::{build_provider, ChatCompletionsProvider};
