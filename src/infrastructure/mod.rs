//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Database: SQLite persistence and seed data
//! - LLM: chat-completions providers
//! - NL-SQL: question to SQL translation
//! - HTTP: the JSON/SSE API
//! - Adapters: the console front end

pub mod adapters;
pub mod config;
pub mod database;
pub mod http;
pub mod llm;
pub mod nlsql;
