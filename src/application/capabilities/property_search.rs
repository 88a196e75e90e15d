//! Free-text property search through the NL-to-SQL engine

use std::sync::Arc;

use async_trait::async_trait;

use super::{Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::search::contains_any;
use crate::application::services::ListingService;
use crate::domain::entities::{Message, MessageType, Response};
use crate::infrastructure::nlsql::SUMMARY_FALLBACK;

const PROPERTY_KEYWORDS: &[&str] = &[
    "house", "houses", "home", "homes", "apartment", "apartments", "flat", "flats",
    "property", "properties", "rent", "rental", "buy", "purchase", "price", "cost",
    "bedroom", "bedrooms", "bathroom", "bathrooms", "area", "location", "city", "suburb",
    "harare", "bulawayo", "mutare", "gweru", "kwekwe", "masvingo",
    "cheap", "expensive", "affordable", "luxury", "modern", "traditional",
];

const NOTHING_FOUND: &str = "Sorry, I couldn't find any properties matching your request.";
const SEARCH_FAILED: &str = "Something went wrong while searching for properties. Please try again.";

pub struct PropertySearchCapability {
    listings: Arc<ListingService>,
}

impl PropertySearchCapability {
    pub fn new(listings: Arc<ListingService>) -> Self {
        Self { listings }
    }

    fn nothing_found(method: &str) -> Response {
        Response::new(NOTHING_FOUND, MessageType::PropertySearch)
            .with_properties(Vec::new())
            .with_metadata("search_method", method)
    }

    /// Filtered store search used when the SQL engine is unavailable
    async fn filtered_search(&self, message: &Message, cause: ChatError) -> Result<Response, ChatError> {
        let extracted = match self.listings.engine().extract_filters(&message.content).await {
            Ok(filters) => filters,
            Err(e) => {
                tracing::debug!("Intent extraction unavailable: {}", e);
                Default::default()
            }
        };

        let filter = self.listings.filter_from(&extracted, &message.content);
        if filter.is_empty() {
            return Ok(Response::error(SEARCH_FAILED, cause.to_string()));
        }

        let found = self.listings.store().search(&filter).await?;
        if found.is_empty() {
            return Ok(Self::nothing_found("filter_search"));
        }

        let summaries = self.listings.summaries(&found).await?;
        let ranked = self.listings.rank_and_filter(&message.content, summaries).await?;
        let content = if ranked.len() == 1 {
            "I found 1 property matching your request.".to_string()
        } else {
            format!("I found {} properties matching your request.", ranked.len())
        };

        Ok(Response::new(content, MessageType::PropertySearch)
            .with_properties(ranked)
            .with_metadata("search_method", "filter_search"))
    }
}

#[async_trait]
impl Capability for PropertySearchCapability {
    fn name(&self) -> &str {
        "PropertySearch"
    }

    fn description(&self) -> &str {
        "Searches for properties using natural language queries"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn can_handle(&self, message: &Message, _ctx: &CapabilityContext) -> bool {
        contains_any(&message.normalized(), PROPERTY_KEYWORDS)
    }

    async fn process(&self, message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let result = match self.listings.query(&message.content).await {
            Ok(result) => result,
            Err(e) => {
                tracing::warn!("SQL engine failed, using filtered search: {}", e);
                return self.filtered_search(message, e).await;
            }
        };

        let enriched = self.listings.enrich_rows(&result.rows).await?;
        if enriched.is_empty() {
            return Ok(Self::nothing_found("nl_sql").with_metadata("sql_query", result.sql));
        }

        let ranked: Vec<_> = self
            .listings
            .rank(&message.content, enriched)
            .await?
            .into_iter()
            .map(|(_, listing)| listing)
            .collect();
        let content = result.chat_response.unwrap_or_else(|| SUMMARY_FALLBACK.to_string());

        Ok(Response::new(content, MessageType::PropertySearch)
            .with_properties(ranked)
            .with_metadata("search_method", "nl_sql")
            .with_metadata("sql_query", result.sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SearchSettings;
    use crate::domain::entities::{ChatSession, ConversationState, NlQueryResult, Property, SearchFilters};
    use crate::domain::traits::QueryEngine;
    use crate::infrastructure::database::Database;
    use crate::infrastructure::nlsql::DisabledQueryEngine;
    use serde_json::json;

    /// Returns fixed rows without touching an LLM
    struct FixedEngine(NlQueryResult);

    #[async_trait]
    impl QueryEngine for FixedEngine {
        async fn query(&self, _question: &str) -> Result<NlQueryResult, ChatError> {
            Ok(self.0.clone())
        }

        async fn extract_filters(&self, _question: &str) -> Result<SearchFilters, ChatError> {
            Ok(SearchFilters::default())
        }
    }

    fn db() -> (Arc<Database>, i64) {
        let db = Database::in_memory().unwrap();
        let id = db
            .add_property(
                &Property::new("Greendale cottage", "Greendale", "Harare")
                    .with_type("House")
                    .with_description("Cosy cottage with borehole")
                    .with_price(700.0),
                &["Borehole"],
            )
            .unwrap();
        (Arc::new(db), id)
    }

    fn ctx() -> CapabilityContext {
        CapabilityContext::new(ChatSession::new("s1", None), ConversationState::new("s1"))
    }

    #[test]
    fn test_keywords() {
        let (db, _) = db();
        let service = ListingService::new(db, Arc::new(DisabledQueryEngine::new("tests")), SearchSettings::default());
        let cap = PropertySearchCapability::new(Arc::new(service));
        assert!(cap.can_handle(&Message::new("Something affordable please"), &ctx()));
        assert!(!cap.can_handle(&Message::new("tell me a joke"), &ctx()));
    }

    #[tokio::test]
    async fn test_engine_rows_are_enriched() {
        let (db, id) = db();
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), json!(id));
        let engine = FixedEngine(NlQueryResult {
            sql: "SELECT id FROM properties".to_string(),
            columns: vec!["id".to_string()],
            rows: vec![row],
            chat_response: Some("One cottage in Greendale.".to_string()),
        });
        let service = ListingService::new(db, Arc::new(engine), SearchSettings::default());
        let cap = PropertySearchCapability::new(Arc::new(service));

        let reply = cap.process(&Message::new("houses with a borehole"), &mut ctx()).await.unwrap();
        assert_eq!(reply.content, "One cottage in Greendale.");
        assert_eq!(reply.properties()[0]["title"], "Greendale cottage");
        assert_eq!(reply.metadata["sql_query"], "SELECT id FROM properties");
        assert_eq!(reply.metadata["property_count"], 1);
    }

    #[tokio::test]
    async fn test_engine_failure_falls_back_to_filtered_search() {
        let (db, _) = db();
        let service = ListingService::new(db, Arc::new(DisabledQueryEngine::new("tests")), SearchSettings::default());
        let cap = PropertySearchCapability::new(Arc::new(service));

        let reply = cap.process(&Message::new("a house in greendale"), &mut ctx()).await.unwrap();
        assert_eq!(reply.message_type, MessageType::PropertySearch);
        assert_eq!(reply.content, "I found 1 property matching your request.");
        assert_eq!(reply.metadata["search_method"], "filter_search");

        let reply = cap.process(&Message::new("something modern"), &mut ctx()).await.unwrap();
        assert_eq!(reply.message_type, MessageType::Error);
        assert_eq!(reply.content, SEARCH_FAILED);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let (db, _) = db();
        let service = ListingService::new(db, Arc::new(FixedEngine(NlQueryResult::default())), SearchSettings::default());
        let cap = PropertySearchCapability::new(Arc::new(service));

        let reply = cap.process(&Message::new("luxury penthouse"), &mut ctx()).await.unwrap();
        assert_eq!(reply.content, NOTHING_FOUND);
        assert_eq!(reply.property_count(), 0);
    }
}
