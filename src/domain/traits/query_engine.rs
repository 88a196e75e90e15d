use async_trait::async_trait;

use crate::application::errors::ChatError;
use crate::domain::entities::{NlQueryResult, SearchFilters};

/// Natural-language access to the listing database
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Translate `question` into SQL, run it and summarize the rows
    async fn query(&self, question: &str) -> Result<NlQueryResult, ChatError>;

    /// Extract structured search filters from `question`
    async fn extract_filters(&self, question: &str) -> Result<SearchFilters, ChatError>;
}
