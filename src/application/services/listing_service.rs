//! Listing service - enrichment and relevance ranking of search results

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::application::errors::ChatError;
use crate::application::search::{extract_locations, extract_max_price, relevance};
use crate::application::search::query_parser::detect_property_type;
use crate::domain::entities::{ListingFilter, NlQueryResult, Property, SearchFilters};
use crate::domain::traits::{ListingStore, QueryEngine};

/// Rows kept when nothing clears the relevance threshold
const FALLBACK_RESULTS: usize = 3;

/// Search tunables
#[derive(Debug, Clone)]
pub struct SearchSettings {
    pub cbd_radius_km: f64,
    pub nearby_limit: usize,
    pub search_limit: usize,
    pub fuzzy_threshold: f64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            cbd_radius_km: 10.0,
            nearby_limit: 20,
            search_limit: 50,
            fuzzy_threshold: 40.0,
        }
    }
}

/// Shared access to listings and the NL query engine
pub struct ListingService {
    store: Arc<dyn ListingStore>,
    engine: Arc<dyn QueryEngine>,
    settings: SearchSettings,
}

impl ListingService {
    pub fn new(store: Arc<dyn ListingStore>, engine: Arc<dyn QueryEngine>, settings: SearchSettings) -> Self {
        Self { store, engine, settings }
    }

    pub fn store(&self) -> &dyn ListingStore {
        self.store.as_ref()
    }

    pub fn engine(&self) -> &dyn QueryEngine {
        self.engine.as_ref()
    }

    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Run the NL query; rows whose `id` points at an unpaid listing are removed
    pub async fn query(&self, question: &str) -> Result<NlQueryResult, ChatError> {
        let mut result = self.engine.query(question).await?;

        let mut visible = Vec::with_capacity(result.rows.len());
        for row in result.rows.drain(..) {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                if matches!(self.store.get_property(id).await?, Some(p) if !p.is_paid) {
                    continue;
                }
            }
            visible.push(row);
        }
        result.rows = visible;
        Ok(result)
    }

    /// Client-facing summaries for store results
    pub async fn summaries(&self, properties: &[Property]) -> Result<Vec<Value>, ChatError> {
        let mut out = Vec::with_capacity(properties.len());
        for property in properties {
            let images = self.store.images_for(property.id).await?;
            out.push(property.summary(images).to_value());
        }
        Ok(out)
    }

    /// Listings around a point, nearest first, each tagged with its distance
    pub async fn nearby(&self, latitude: f64, longitude: f64) -> Result<Vec<Value>, ChatError> {
        let found = self
            .store
            .nearby(latitude, longitude, self.settings.cbd_radius_km, self.settings.nearby_limit)
            .await?;

        let mut out = Vec::with_capacity(found.len());
        for (property, km) in found {
            let images = self.store.images_for(property.id).await?;
            out.push(property.summary(images).with_distance(km).to_value());
        }
        Ok(out)
    }

    /// Replace raw SQL rows with full listing summaries where the listing can be found.
    /// Rows resolving to unpaid listings are dropped.
    pub async fn enrich_rows(&self, rows: &[Map<String, Value>]) -> Result<Vec<Value>, ChatError> {
        let mut out = Vec::with_capacity(rows.len());

        for row in rows {
            let by_id = match row.get("id").and_then(Value::as_i64) {
                Some(id) => self.store.get_property(id).await?,
                None => None,
            };
            let property = match (by_id, row.get("title").and_then(Value::as_str)) {
                (Some(p), _) => Some(p),
                (None, Some(title)) if !title.is_empty() => self.store.find_property_by_title(title).await?,
                _ => None,
            };

            let value = match property {
                Some(p) if !p.is_paid => {
                    tracing::debug!("Dropping unpaid listing {} from query results", p.id);
                    continue;
                }
                Some(p) => {
                    let images = self.store.images_for(p.id).await?;
                    p.summary(images).to_value()
                }
                None => minimal_row(row),
            };
            out.push(value);
        }

        Ok(out)
    }

    /// Score each listing against the query, best first
    pub async fn rank(&self, query: &str, listings: Vec<Value>) -> Result<Vec<(f64, Value)>, ChatError> {
        let mut scored = Vec::with_capacity(listings.len());

        for listing in listings {
            let amenities = match listing.get("id").and_then(Value::as_i64) {
                Some(id) => self.store.amenities_for(id).await?.join(" "),
                None => String::new(),
            };
            let description = listing.get("description").and_then(Value::as_str).unwrap_or_default();
            let score = relevance(query, description, &amenities);
            scored.push((score, listing));
        }

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        Ok(scored)
    }

    /// Ranked listings above the threshold, or the best few when none qualify
    pub async fn rank_and_filter(&self, query: &str, listings: Vec<Value>) -> Result<Vec<Value>, ChatError> {
        let scored = self.rank(query, listings).await?;
        let threshold = self.settings.fuzzy_threshold;

        let kept: Vec<Value> = scored
            .iter()
            .filter(|(score, _)| *score > threshold)
            .map(|(_, v)| v.clone())
            .collect();

        if kept.is_empty() {
            tracing::debug!("No listing above threshold {}, keeping top {}", threshold, FALLBACK_RESULTS);
            return Ok(scored.into_iter().take(FALLBACK_RESULTS).map(|(_, v)| v).collect());
        }
        Ok(kept)
    }

    /// Filter built from LLM-extracted intent, topped up with keyword parsing
    pub fn filter_from(&self, filters: &SearchFilters, text: &str) -> ListingFilter {
        let lowered = text.to_lowercase();
        let mut filter = ListingFilter::new(self.settings.search_limit);

        filter.cities.extend(filters.city.iter().map(|c| c.trim().to_lowercase()).filter(|c| !c.is_empty()));
        filter.suburbs.extend(filters.suburb.iter().map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty()));
        if !filter.has_location() {
            let found = extract_locations(&lowered);
            filter.suburbs = found.suburbs;
            filter.cities = found.cities;
            filter.places = found.ambiguous;
        }

        filter.property_type = filters
            .property_type
            .clone()
            .or_else(|| detect_property_type(&lowered).map(str::to_string));
        filter.max_price = filters.max_price.or_else(|| extract_max_price(&lowered));
        filter.amenities = filters.amenities.clone();
        filter.keywords = filters.keywords.clone();
        filter
    }
}

fn minimal_row(row: &Map<String, Value>) -> Value {
    let get = |key: &str| row.get(key).cloned().unwrap_or(Value::Null);
    json!({
        "id": get("id"),
        "title": row.get("title").and_then(Value::as_str).unwrap_or("Property"),
        "suburb": get("suburb"),
        "city": get("city"),
        "price": get("price"),
        "main_image": get("main_image"),
        "description": get("description"),
        "property_images": row.get("property_images").cloned().unwrap_or_else(|| json!([])),
    })
}
