//! LLM Configuration

use serde::{Deserialize, Serialize};

/// SQL assistant persona used by the query engine
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an expert SQL assistant for a property search app in Zimbabwe. \
Your job is to convert natural language into SQL queries that work with the database schema. \
The main table is 'properties' which contains columns like: title, suburb, city, price, property_type, description. \
The user might say things like: 'show me houses in Avondale under $500' or 'I want a flat in Harare with garden and WiFi'. \
Use proper WHERE clauses and lowercase string values when filtering by suburb, city, or property_type. \
Do not fabricate table or column names.";

/// LLM Provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    #[default]
    Groq,
    OpenAI,
}

impl LLMProvider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "groq" | "dev" => Some(Self::Groq),
            "openai" | "prod" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// LLM Configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LLMConfig {
    /// Default provider
    pub provider: LLMProvider,

    /// Provider-specific API keys
    pub groq_api_key: Option<String>,
    pub openai_api_key: Option<String>,

    /// Default model for each provider
    pub groq_model: Option<String>,
    pub openai_model: Option<String>,

    /// Default settings
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    pub system_prompt: Option<String>,
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Groq,
            groq_api_key: None,
            openai_api_key: None,
            groq_model: Some("llama3-8b-8192".to_string()),
            openai_model: Some("gpt-4".to_string()),
            temperature: 0.2,
            max_tokens: Some(512),
            system_prompt: Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        }
    }
}

impl LLMConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Override fields from environment variables
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GROQ_API_KEY") {
            self.groq_api_key = Some(key);
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.openai_api_key = Some(key);
        }

        // CHAT_ENV is the legacy dev/prod switch
        let provider = std::env::var("LLM_PROVIDER").or_else(|_| std::env::var("CHAT_ENV"));
        if let Some(p) = provider.ok().as_deref().and_then(LLMProvider::parse) {
            self.provider = p;
        }

        if let Ok(prompt) = std::env::var("LLM_SYSTEM_PROMPT") {
            self.system_prompt = Some(prompt);
        }

        if let Ok(temp) = std::env::var("LLM_TEMPERATURE") {
            if let Ok(t) = temp.parse() {
                self.temperature = t;
            }
        }
    }

    /// Get API key for a provider
    pub fn api_key(&self, provider: LLMProvider) -> Option<&str> {
        match provider {
            LLMProvider::Groq => self.groq_api_key.as_deref(),
            LLMProvider::OpenAI => self.openai_api_key.as_deref(),
        }
    }

    /// Get model for a provider
    pub fn model(&self, provider: LLMProvider) -> &str {
        match provider {
            LLMProvider::Groq => self.groq_model.as_deref().unwrap_or("llama3-8b-8192"),
            LLMProvider::OpenAI => self.openai_model.as_deref().unwrap_or("gpt-4"),
        }
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }
}
