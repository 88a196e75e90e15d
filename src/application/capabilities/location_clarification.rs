//! Multi-turn "near the CBD" searches
//!
//! A request mentioning the CBD (or proximity to a city) is resolved to a
//! central business district. When the city or district is unclear the user
//! is asked, and the conversation state remembers the pending query until
//! the follow-up arrives.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use super::{Capability, CapabilityContext};
use crate::application::errors::ChatError;
use crate::application::search::contains_any;
use crate::application::search::query_parser::{matching_terms, title_case, CBD_CITIES};
use crate::application::services::ListingService;
use crate::domain::entities::{CbdLocation, CbdSuggestion, ListingFilter, Message, MessageType, Response};

const CBD_KEYWORDS: &[&str] = &[
    "cbd", "central business district", "downtown", "city center", "city centre", "town center",
    "near cbd", "close to cbd", "cbd area", "central area", "downtown area",
];

const PROXIMITY_KEYWORDS: &[&str] = &[
    "near", "close to", "around", "in the area of", "nearby", "vicinity", "surrounding",
    "proximity", "radius", "distance",
];

const ASK_CITY: &str = "I'd be happy to help you find properties near the CBD! Which city are you looking in? \
(e.g., Harare, Bulawayo, Mutare, etc.)";

const UNKNOWN_CITY: &str = "I'm sorry, I didn't recognize that city. Please try again with a Zimbabwean city \
like Harare, Bulawayo, Mutare, etc.";

pub struct LocationClarificationCapability {
    listings: Arc<ListingService>,
}

impl LocationClarificationCapability {
    pub fn new(listings: Arc<ListingService>) -> Self {
        Self { listings }
    }

    async fn initial(&self, query: &str, ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let lowered = query.to_lowercase();
        let Some(city) = matching_terms(&lowered, CBD_CITIES).into_iter().next() else {
            ctx.state.waiting_for_location = true;
            ctx.state.pending_search_query = query.to_string();
            return Ok(Response::conversational(ASK_CITY).with_metadata("waiting_for_location", true));
        };

        let mut cbds = self.listings.store().cbds_in_city(&city).await?;
        match cbds.len() {
            0 => {
                ctx.state.reset();
                self.search_city(&city).await
            }
            1 => {
                let cbd = cbds.remove(0);
                ctx.state.reset();
                self.search_near(&cbd).await
            }
            _ => {
                ctx.state.waiting_for_cbd_clarification = true;
                ctx.state.pending_search_query = query.to_string();
                ctx.state.suggested_cbds = cbds
                    .iter()
                    .map(|c| CbdSuggestion { id: c.id, name: c.name.clone(), city: c.city.clone() })
                    .collect();

                let content = format!(
                    "I found multiple CBD areas in {}. Which one are you interested in?\n\n{}",
                    title_case(&city),
                    bullet_list(&ctx.state.suggested_cbds)
                );
                Ok(Response::conversational(content)
                    .with_metadata("waiting_for_cbd_clarification", true)
                    .with_metadata("suggested_cbds", json!(ctx.state.suggested_cbds)))
            }
        }
    }

    async fn resolve_city(&self, reply: &str, ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let lowered = reply.to_lowercase();
        let Some(city) = matching_terms(&lowered, CBD_CITIES).into_iter().next() else {
            ctx.state.reset();
            return Ok(Response::conversational(UNKNOWN_CITY));
        };

        ctx.state.waiting_for_location = false;
        let pending = std::mem::take(&mut ctx.state.pending_search_query);
        if pending.trim().is_empty() {
            return Ok(Response::conversational(format!(
                "Great! Now I can help you find properties near the CBD in {}. What type of property are you looking for?",
                title_case(&city)
            )));
        }

        self.initial(&format!("{} in {}", pending, city), ctx).await
    }

    async fn resolve_cbd(&self, reply: &str, ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        let lowered = reply.to_lowercase();
        let suggestions = &ctx.state.suggested_cbds;

        let chosen = suggestions
            .iter()
            .find(|s| lowered.contains(&s.name.to_lowercase()))
            .or_else(|| {
                suggestions.iter().find(|s| {
                    let name = s.name.to_lowercase();
                    lowered
                        .split(|c: char| !c.is_alphanumeric())
                        .filter(|w| w.len() > 2 && *w != "cbd")
                        .any(|w| name.split_whitespace().any(|n| n == w))
                })
            })
            .map(|s| s.id);

        let cbd = match chosen {
            Some(id) => self.listings.store().get_cbd(id).await?,
            None => None,
        };

        match cbd {
            Some(cbd) => {
                ctx.state.selected_cbd = Some(cbd.id);
                let response = self.search_near(&cbd).await;
                ctx.state.reset();
                response
            }
            None => Ok(Response::conversational(format!(
                "I didn't understand your selection. Please choose from the following CBD areas:\n\n{}",
                bullet_list(&ctx.state.suggested_cbds)
            ))),
        }
    }

    async fn search_near(&self, cbd: &CbdLocation) -> Result<Response, ChatError> {
        let radius = self.listings.settings().cbd_radius_km;
        let properties = self.listings.nearby(cbd.latitude, cbd.longitude).await?;
        let location = format!("{}, {}", cbd.name, cbd.city);

        tracing::info!(cbd = %cbd.name, found = properties.len(), "CBD proximity search");

        let content = if properties.is_empty() {
            format!(
                "I couldn't find any properties within {}km of {} in {}. Would you like me to search in a wider area or try a different location?",
                radius, cbd.name, cbd.city
            )
        } else {
            format!(
                "I found {} properties within {}km of {} in {}. Here are the closest ones:",
                properties.len(),
                radius,
                cbd.name,
                cbd.city
            )
        };

        Ok(Response::new(content, MessageType::PropertySearch)
            .with_properties(properties)
            .with_metadata("search_location", location)
            .with_metadata("search_radius_km", radius)
            .with_metadata("cbd_coordinates", json!({"lat": cbd.latitude, "lng": cbd.longitude})))
    }

    async fn search_city(&self, city: &str) -> Result<Response, ChatError> {
        let mut filter = ListingFilter::new(self.listings.settings().nearby_limit);
        filter.cities.push(city.to_string());

        let found = self.listings.store().search(&filter).await?;
        let properties = self.listings.summaries(&found).await?;
        let city = title_case(city);

        let content = if properties.is_empty() {
            format!("I couldn't find any properties in {}. Would you like me to search in nearby areas?", city)
        } else {
            format!("I found {} properties in {}. Here are the most recent listings:", properties.len(), city)
        };

        Ok(Response::new(content, MessageType::PropertySearch)
            .with_properties(properties)
            .with_metadata("search_location", city)
            .with_metadata("note", "No CBD data available, showing city-wide results"))
    }
}

fn bullet_list(suggestions: &[CbdSuggestion]) -> String {
    suggestions
        .iter()
        .map(|s| format!("• {}", s.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl Capability for LocationClarificationCapability {
    fn name(&self) -> &str {
        "LocationClarification"
    }

    fn description(&self) -> &str {
        "Resolves CBD and proximity searches, asking for the city or district when unclear"
    }

    fn priority(&self) -> i32 {
        20
    }

    fn can_handle(&self, message: &Message, ctx: &CapabilityContext) -> bool {
        if ctx.state.is_awaiting_reply() {
            return true;
        }

        let text = message.normalized();
        contains_any(&text, CBD_KEYWORDS)
            || (contains_any(&text, PROXIMITY_KEYWORDS) && contains_any(&text, CBD_CITIES))
    }

    async fn process(&self, message: &Message, ctx: &mut CapabilityContext) -> Result<Response, ChatError> {
        if ctx.state.waiting_for_cbd_clarification {
            self.resolve_cbd(&message.content, ctx).await
        } else if ctx.state.waiting_for_location {
            self.resolve_city(&message.content, ctx).await
        } else {
            self.initial(&message.content, ctx).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::SearchSettings;
    use crate::domain::entities::{ChatSession, ConversationState, Property};
    use crate::infrastructure::database::{Database, SeedReport};
    use crate::infrastructure::nlsql::DisabledQueryEngine;

    fn capability() -> (LocationClarificationCapability, Arc<Database>) {
        let db = Database::in_memory().unwrap();
        db.seed_cbds(&mut SeedReport::default()).unwrap();
        db.add_property(
            &Property::new("Town flat", "Bulawayo Central", "Bulawayo").with_location(-20.155, 28.585).with_price(350.0),
            &[],
        )
        .unwrap();
        let db = Arc::new(db);
        let service = ListingService::new(db.clone(), Arc::new(DisabledQueryEngine::new("tests")), SearchSettings::default());
        (LocationClarificationCapability::new(Arc::new(service)), db)
    }

    fn ctx() -> CapabilityContext {
        CapabilityContext::new(ChatSession::new("s1", None), ConversationState::new("s1"))
    }

    #[test]
    fn test_triggers() {
        let (cap, _) = capability();
        let mut ctx = ctx();
        assert!(cap.can_handle(&Message::new("flats near the CBD"), &ctx));
        assert!(cap.can_handle(&Message::new("houses close to Bulawayo"), &ctx));
        assert!(!cap.can_handle(&Message::new("houses in Bulawayo"), &ctx));
        assert!(!cap.can_handle(&Message::new("near the river"), &ctx));

        ctx.state.waiting_for_location = true;
        assert!(cap.can_handle(&Message::new("Bulawayo"), &ctx));
    }

    #[tokio::test]
    async fn test_asks_for_city_then_resolves() {
        let (cap, _) = capability();
        let mut ctx = ctx();

        let reply = cap.process(&Message::new("apartments near the cbd"), &mut ctx).await.unwrap();
        assert_eq!(reply.content, ASK_CITY);
        assert!(ctx.state.waiting_for_location);
        assert_eq!(ctx.state.pending_search_query, "apartments near the cbd");

        let reply = cap.process(&Message::new("Bulawayo"), &mut ctx).await.unwrap();
        assert_eq!(reply.message_type, MessageType::PropertySearch);
        assert!(reply.content.starts_with("I found 1 properties within 10km of"));
        assert_eq!(reply.properties()[0]["title"], "Town flat");
        assert!(reply.properties()[0]["distance_from_cbd"].is_number());
        assert_eq!(ctx.state, ConversationState::new("s1"));
    }

    #[tokio::test]
    async fn test_unknown_city_resets_state() {
        let (cap, _) = capability();
        let mut ctx = ctx();
        ctx.state.waiting_for_location = true;
        ctx.state.pending_search_query = "houses near cbd".to_string();

        let reply = cap.process(&Message::new("Atlantis"), &mut ctx).await.unwrap();
        assert_eq!(reply.content, UNKNOWN_CITY);
        assert!(!ctx.state.is_awaiting_reply());
    }

    #[tokio::test]
    async fn test_multiple_cbds_then_selection() {
        let (cap, db) = capability();
        db.upsert_cbd(&CbdLocation {
            id: 0,
            name: "Bulawayo Industrial".to_string(),
            city: "Bulawayo".to_string(),
            latitude: -20.17,
            longitude: 28.57,
            description: String::new(),
            is_active: true,
        })
        .unwrap();
        let mut ctx = ctx();

        let reply = cap.process(&Message::new("houses near the cbd in bulawayo"), &mut ctx).await.unwrap();
        assert!(reply.content.starts_with("I found multiple CBD areas in Bulawayo."));
        assert!(ctx.state.waiting_for_cbd_clarification);
        assert_eq!(ctx.state.suggested_cbds.len(), 2);

        let reply = cap.process(&Message::new("the first one please"), &mut ctx).await.unwrap();
        assert!(reply.content.starts_with("I didn't understand your selection."));
        assert!(ctx.state.waiting_for_cbd_clarification);

        let reply = cap.process(&Message::new("industrial"), &mut ctx).await.unwrap();
        assert_eq!(reply.message_type, MessageType::PropertySearch);
        assert!(reply.content.contains("Bulawayo Industrial"));
        assert!(!ctx.state.is_awaiting_reply());
    }
}
