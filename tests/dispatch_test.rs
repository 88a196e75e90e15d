//! End-to-end dispatch tests over an in-memory database
//! Run with: cargo test --test dispatch_test

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use tourwise_chat::application::capabilities::default_registry;
use tourwise_chat::application::errors::ChatError;
use tourwise_chat::application::messaging::{Dispatcher, MessageParser};
use tourwise_chat::application::services::{ChatService, ListingService, SearchSettings, SessionSettings};
use tourwise_chat::domain::entities::{MessageType, NlQueryResult, Property, SearchFilters, Sender};
use tourwise_chat::domain::traits::QueryEngine;
use tourwise_chat::infrastructure::database::{Database, SeedReport};

/// Answers every question with the same rows
struct StubEngine {
    rows: Vec<Map<String, Value>>,
}

#[async_trait]
impl QueryEngine for StubEngine {
    async fn query(&self, _question: &str) -> Result<NlQueryResult, ChatError> {
        Ok(NlQueryResult {
            sql: "SELECT id, title FROM properties".to_string(),
            columns: vec!["id".to_string(), "title".to_string()],
            rows: self.rows.clone(),
            chat_response: Some("Here are some listings.".to_string()),
        })
    }

    async fn extract_filters(&self, _question: &str) -> Result<SearchFilters, ChatError> {
        Ok(SearchFilters::default())
    }
}

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn setup(rows: Vec<Map<String, Value>>) -> (Dispatcher, Arc<ChatService>) {
    build(Database::in_memory().unwrap(), rows)
}

fn build(db: Database, rows: Vec<Map<String, Value>>) -> (Dispatcher, Arc<ChatService>) {
    db.seed_cbds(&mut SeedReport::default()).unwrap();
    let db = Arc::new(db);

    let listings = Arc::new(ListingService::new(
        db.clone(),
        Arc::new(StubEngine { rows }),
        SearchSettings::default(),
    ));
    let chat = Arc::new(ChatService::new(db.clone(), SessionSettings::default()));
    let dispatcher = Dispatcher::new(&default_registry(listings), chat.clone());
    (dispatcher, chat)
}

#[tokio::test]
async fn test_greeting_is_conversational() {
    let (dispatcher, _) = setup(Vec::new());

    let outcome = dispatcher.process("hello", None, None).await.unwrap();
    assert_eq!(outcome.response.message_type, MessageType::Greeting);
    assert!(outcome.response.success);
    assert_eq!(outcome.response.metadata["is_conversational"], json!(true));
    assert!(!outcome.session_id.is_empty());
}

#[tokio::test]
async fn test_property_search_enriches_engine_rows() {
    let db = Database::in_memory().unwrap();
    let id = db
        .add_property(
            &Property::new("Cheap flat in Avondale", "Avondale", "Harare")
                .with_type("apartment")
                .with_price(300.0),
            &["WiFi"],
        )
        .unwrap();
    let (dispatcher, _) = build(db, vec![row(json!({"id": id, "title": "Cheap flat in Avondale"}))]);

    let outcome = dispatcher.process("show me a cheap flat", None, None).await.unwrap();
    let response = outcome.response;
    assert_eq!(response.message_type, MessageType::PropertySearch);
    assert_eq!(response.content, "Here are some listings.");
    assert_eq!(response.metadata["search_method"], json!("nl_sql"));
    assert_eq!(response.property_count(), 1);
    assert_eq!(response.properties()[0]["suburb"], json!("Avondale"));
}

#[tokio::test]
async fn test_unmatched_message_falls_back_to_database_query() {
    let (dispatcher, _) = setup(Vec::new());

    let outcome = dispatcher.process("zxcv qwerty", None, None).await.unwrap();
    assert_eq!(outcome.response.message_type, MessageType::DatabaseQuery);
    assert!(outcome.response.success);
    assert_eq!(outcome.response.property_count(), 0);
}

#[tokio::test]
async fn test_messages_are_persisted_in_order() {
    let (dispatcher, chat) = setup(Vec::new());

    let first = dispatcher.process("hello", None, Some(7)).await.unwrap();
    let second = dispatcher
        .process("thanks", Some(&first.session_id), Some(7))
        .await
        .unwrap();
    assert_eq!(first.session_id, second.session_id);

    let history = chat.history(&first.session_id).await.unwrap();
    let senders: Vec<Sender> = history.iter().map(|m| m.sender).collect();
    assert_eq!(senders, vec![Sender::User, Sender::Bot, Sender::User, Sender::Bot]);
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[0].message_type, "text");
    assert_eq!(history[3].message_type, "gratitude");

    let session = chat.get_session(&first.session_id).await.unwrap().unwrap();
    assert_eq!(session.title.as_deref(), Some("hello"));
    assert_eq!(session.user_id, Some(7));
    assert!(session.has_ai_response);
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let (dispatcher, chat) = setup(Vec::new());

    let result = dispatcher.process("   ", None, None).await;
    assert!(matches!(result, Err(ChatError::InvalidInput(_))));
    assert!(chat.list_sessions(None, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_parser_limit_is_configurable() {
    let (dispatcher, _) = setup(Vec::new());
    let dispatcher = dispatcher.with_parser(MessageParser::new(10));

    let result = dispatcher.process("houses in avondale please", None, None).await;
    assert!(matches!(result, Err(ChatError::InvalidInput(_))));
    assert!(dispatcher.process("hello", None, None).await.is_ok());
}
