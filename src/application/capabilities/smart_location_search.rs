//! Location-aware search: "houses in Avondale under $500"

use std::sync::Arc;

use async_trait::async_trait;

use super::{Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::formatter::money;
use crate::application::search::query_parser::{detect_property_type, title_case, KNOWN_CITIES, KNOWN_SUBURBS};
use crate::application::search::{contains_any, extract_locations, extract_max_price};
use crate::application::services::ListingService;
use crate::domain::entities::{ListingFilter, Message, MessageType, Response};

const SEARCH_TERMS: &[&str] = &[
    "house", "houses", "apartment", "apartments", "flat", "flats", "property", "properties",
    "home", "homes", "room", "rooms", "guesthouse", "guest house", "airbnb",
];

const LOCATION_WORDS: &[&str] = &["in", "at", "near", "around", "located", "situated", "area", "suburb", "city"];

const ASK_LOCATION: &str = "I'd be happy to help you find properties! Could you please specify which area or city \
in Zimbabwe you're interested in? For example: 'houses in Avondale' or 'apartments in Harare'.";

const NOTHING_FOUND: &str = "Sorry, I couldn't find any properties matching your request.";

pub struct SmartLocationSearchCapability {
    listings: Arc<ListingService>,
}

impl SmartLocationSearchCapability {
    pub fn new(listings: Arc<ListingService>) -> Self {
        Self { listings }
    }

    /// Free-text fallback when the structured search finds nothing
    async fn fallback(&self, message: &Message) -> Result<Response, ChatError> {
        match self.listings.query(&message.content).await {
            Ok(result) if !result.is_empty() => {
                let enriched = self.listings.enrich_rows(&result.rows).await?;
                let ranked = self.listings.rank_and_filter(&message.content, enriched).await?;
                let content = result
                    .chat_response
                    .clone()
                    .unwrap_or_else(|| format!("I found {} properties matching your request.", ranked.len()));

                Ok(Response::new(content, MessageType::PropertySearch)
                    .with_properties(ranked)
                    .with_metadata("search_method", "sql_fallback")
                    .with_metadata("sql_query", result.sql))
            }
            Ok(_) => Ok(Response::new(NOTHING_FOUND, MessageType::PropertySearch)
                .with_properties(Vec::new())
                .with_metadata("search_method", "sql_fallback")),
            Err(e) => {
                tracing::warn!("SQL fallback failed: {}", e);
                Ok(Response::new(NOTHING_FOUND, MessageType::PropertySearch).with_properties(Vec::new()))
            }
        }
    }
}

#[async_trait]
impl Capability for SmartLocationSearchCapability {
    fn name(&self) -> &str {
        "SmartLocationSearch"
    }

    fn description(&self) -> &str {
        "Searches listings by suburb, city, property type and price"
    }

    fn priority(&self) -> i32 {
        25
    }

    fn can_handle(&self, message: &Message, _ctx: &CapabilityContext) -> bool {
        let text = message.normalized();
        contains_any(&text, SEARCH_TERMS)
            && (contains_any(&text, LOCATION_WORDS)
                || contains_any(&text, KNOWN_SUBURBS)
                || contains_any(&text, KNOWN_CITIES))
    }

    async fn process(&self, message: &Message, _ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let text = message.normalized();
        let locations = extract_locations(&text);

        if locations.is_empty() {
            return Ok(Response::conversational(ASK_LOCATION).with_metadata("needs_location_clarification", true));
        }

        let mut filter = ListingFilter::new(self.listings.settings().search_limit);
        filter.suburbs = locations.suburbs.clone();
        filter.cities = locations.cities.clone();
        filter.places = locations.ambiguous.clone();
        filter.property_type = detect_property_type(&text).map(str::to_string);
        filter.max_price = extract_max_price(&text);

        tracing::debug!(filter = ?filter, "location search");
        let found = self.listings.store().search(&filter).await?;
        if found.is_empty() {
            return self.fallback(message).await;
        }

        let properties = self.listings.summaries(&found).await?;
        let location = locations.names().iter().map(|n| title_case(n)).collect::<Vec<_>>().join(", ");
        let price_info = filter
            .max_price
            .map(|p| format!(" under {}", money(p, 0)))
            .unwrap_or_default();

        let content = if properties.len() == 1 {
            format!("Perfect! I found 1 property in {}{}.", location, price_info)
        } else {
            format!("Great! I found {} properties in {}{}.", properties.len(), location, price_info)
        };

        Ok(Response::new(content, MessageType::PropertySearch)
            .with_properties(properties)
            .with_metadata("search_location", location)
            .with_metadata("search_method", "smart_location_search"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SearchSettings;
    use crate::domain::entities::{ChatSession, ConversationState, Property};
    use crate::infrastructure::database::Database;
    use crate::infrastructure::nlsql::DisabledQueryEngine;

    fn capability() -> SmartLocationSearchCapability {
        let db = Database::in_memory().unwrap();
        db.add_property(&Property::new("Avondale house", "Avondale", "Harare").with_type("House").with_price(450.0), &[])
            .unwrap();
        db.add_property(&Property::new("Avondale villa", "Avondale", "Harare").with_type("House").with_price(2500.0), &[])
            .unwrap();
        db.add_property(&Property::new("Avondale lodge", "Avondale", "Harare").with_type("guesthouse").with_price(90.0), &[])
            .unwrap();
        db.add_property(&Property::new("Hillside flat", "Hillside", "Bulawayo").with_type("Apartment").with_price(300.0), &[])
            .unwrap();
        let service = ListingService::new(Arc::new(db), Arc::new(DisabledQueryEngine::new("tests")), SearchSettings::default());
        SmartLocationSearchCapability::new(Arc::new(service))
    }

    fn ctx() -> CapabilityContext {
        CapabilityContext::new(ChatSession::new("s1", None), ConversationState::new("s1"))
    }

    #[test]
    fn test_triggers() {
        let cap = capability();
        let ctx = ctx();
        assert!(cap.can_handle(&Message::new("houses in Avondale"), &ctx));
        assert!(cap.can_handle(&Message::new("Borrowdale apartments"), &ctx));
        assert!(!cap.can_handle(&Message::new("how many properties are there"), &ctx));
        assert!(!cap.can_handle(&Message::new("what's the weather in Harare"), &ctx));
    }

    #[tokio::test]
    async fn test_search_with_price_cap() {
        let cap = capability();
        let mut ctx = ctx();

        let reply = cap.process(&Message::new("Houses in Avondale under $1,000"), &mut ctx).await.unwrap();
        assert_eq!(reply.content, "Perfect! I found 1 property in Avondale under $1,000.");
        assert_eq!(reply.properties()[0]["title"], "Avondale house");
        assert_eq!(reply.metadata["search_method"], "smart_location_search");

        let reply = cap.process(&Message::new("houses in avondale"), &mut ctx).await.unwrap();
        assert_eq!(reply.content, "Great! I found 2 properties in Avondale.");
        assert!(reply.properties().iter().all(|p| p["title"] != "Avondale lodge"));
    }

    #[tokio::test]
    async fn test_asks_for_location() {
        let cap = capability();
        let reply = cap.process(&Message::new("houses in good condition"), &mut ctx()).await.unwrap();
        assert_eq!(reply.content, ASK_LOCATION);
        assert_eq!(reply.metadata["needs_location_clarification"], true);
    }

    #[tokio::test]
    async fn test_no_rows_and_no_engine_reports_nothing_found() {
        let cap = capability();
        let reply = cap.process(&Message::new("apartments in Mutare"), &mut ctx()).await.unwrap();
        assert_eq!(reply.message_type, MessageType::PropertySearch);
        assert_eq!(reply.content, NOTHING_FOUND);
        assert_eq!(reply.property_count(), 0);
    }
}
