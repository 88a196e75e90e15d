//! Tests for LLM providers and configuration

use crate::infrastructure::llm::{
    build_provider, ChatCompletionsProvider, LLMConfig, LLMError, LLMMessage, LLMProvider, Role, LLM,
};

#[tokio::test]
#[ignore] // Requires GROQ_API_KEY environment variable
async fn test_groq_chat() {
    let config = LLMConfig::from_env();
    let api_key = config.api_key(LLMProvider::Groq).expect("GROQ_API_KEY not set");

    let provider = ChatCompletionsProvider::groq(api_key, None);

    let messages = vec![
        LLMMessage::system("You are a helpful assistant."),
        LLMMessage::user("What is 2+2?"),
    ];

    let response = provider.chat(messages, None, Some(0.7), Some(100))
        .await
        .expect("Chat request failed");

    assert!(!response.content.is_empty());
}

#[tokio::test]
async fn test_empty_key_is_rejected_before_network() {
    let provider = ChatCompletionsProvider::groq("", None);
    let result = provider.chat(vec![LLMMessage::user("hi")], None, None, None).await;
    assert!(matches!(result, Err(LLMError::MissingApiKey)));
}

#[test]
fn test_build_provider_requires_key() {
    let mut config = LLMConfig::default();
    config.groq_api_key = None;
    assert!(matches!(build_provider(&config), Err(LLMError::MissingApiKey)));

    config.groq_api_key = Some("gsk_test".to_string());
    let provider = build_provider(&config).expect("provider");
    assert_eq!(provider.name(), "groq");

    config.provider = LLMProvider::OpenAI;
    config.openai_api_key = Some("sk-test".to_string());
    assert_eq!(build_provider(&config).expect("provider").name(), "openai");
}

#[test]
fn test_provider_parse_accepts_legacy_env_names() {
    assert_eq!(LLMProvider::parse("dev"), Some(LLMProvider::Groq));
    assert_eq!(LLMProvider::parse("PROD"), Some(LLMProvider::OpenAI));
    assert_eq!(LLMProvider::parse("minimax"), None);
}

#[test]
fn test_llm_message_builder() {
    let msg = LLMMessage::user("Hello");
    assert_eq!(msg.role, Role::User);
    assert_eq!(msg.content, "Hello");

    let system_msg = LLMMessage::system("You are helpful.");
    assert_eq!(system_msg.role, Role::System);

    let wire = serde_json::to_value(&system_msg).unwrap();
    assert_eq!(wire["role"], "system");
}
