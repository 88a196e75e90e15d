use crate::domain::entities::SearchFilters;

pub const INTENT_PROMPT: &str = "Extract property search filters from the user's message. \
Answer with a single JSON object and nothing else, using these keys: \
\"city\", \"suburb\", \"max_price\" (number), \"property_type\" (house, apartment, room, guesthouse or airbnb), \
\"amenities\" (list of strings), \"keywords\" (list of strings). Use null or [] for anything not mentioned.";

/// Parse the filter JSON out of an LLM reply, tolerating fences and prose
pub fn parse_filters(reply: &str) -> SearchFilters {
    let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) else {
        tracing::warn!("No JSON object in intent reply");
        return SearchFilters::default();
    };
    if end < start {
        return SearchFilters::default();
    }

    match serde_json::from_str::<SearchFilters>(&reply[start..=end]) {
        Ok(filters) => filters,
        Err(e) => {
            tracing::warn!("Could not parse intent reply: {}", e);
            SearchFilters::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_json() {
        let reply = "```json\n{\"city\": \"Harare\", \"property_type\": \"house\", \"max_price\": 800, \"amenities\": [\"wifi\"]}\n```";
        let filters = parse_filters(reply);
        assert_eq!(filters.city.as_deref(), Some("Harare"));
        assert_eq!(filters.property_type.as_deref(), Some("house"));
        assert_eq!(filters.max_price, Some(800.0));
        assert_eq!(filters.amenities, vec!["wifi"]);
    }

    #[test]
    fn test_garbage_yields_empty_filters() {
        assert!(parse_filters("I could not understand that").is_empty());
        assert!(parse_filters("{not json}").is_empty());
    }
}
