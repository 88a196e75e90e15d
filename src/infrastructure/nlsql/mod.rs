//! Natural-language to SQL delegation

pub mod engine;
pub mod intent;
pub mod rewrite;

use async_trait::async_trait;

use crate::application::errors::ChatError;
use crate::domain::entities::{NlQueryResult, SearchFilters};
use crate::domain::traits::QueryEngine;

pub use engine::{SqlQueryEngine, SUMMARY_FALLBACK};

/// Stand-in used when no LLM API key is configured
pub struct DisabledQueryEngine {
    reason: String,
}

impl DisabledQueryEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

#[async_trait]
impl QueryEngine for DisabledQueryEngine {
    async fn query(&self, _question: &str) -> Result<NlQueryResult, ChatError> {
        Err(ChatError::Query(format!("query engine unavailable: {}", self.reason)))
    }

    async fn extract_filters(&self, _question: &str) -> Result<SearchFilters, ChatError> {
        Err(ChatError::Query(format!("query engine unavailable: {}", self.reason)))
    }
}
