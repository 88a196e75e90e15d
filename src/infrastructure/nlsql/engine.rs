use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::intent::{parse_filters, INTENT_PROMPT};
use super::rewrite::{case_insensitive_property_type, ensure_required_columns, extract_sql, is_read_only};
use crate::application::errors::ChatError;
use crate::domain::entities::{NlQueryResult, SearchFilters};
use crate::domain::traits::{ListingStore, QueryEngine};
use crate::infrastructure::database::Database;
use crate::infrastructure::llm::{LLMConfig, LLMMessage, LLM};

pub const SUMMARY_FALLBACK: &str = "Here is what I found.";
const NO_ROWS_SUMMARY: &str = "I couldn't find anything matching that.";
const SUMMARY_ROWS: usize = 10;

const SCHEMA: &str = "SQLite schema:
properties(id, title, description, street_address, suburb, city, state_or_region, country, \
property_type, bedrooms, bathrooms, area, price, main_image, latitude, longitude, listing_type, is_paid, created_at)
amenities(id, name)
property_amenities(property_id, amenity_id)
property_images(id, property_id, image)
Only listings with is_paid = 1 are visible to users.";

const SUMMARY_PROMPT: &str = "You are Tourwise, a friendly assistant for a Zimbabwean property marketplace. \
Summarize the query results for the user in one or two short sentences. Do not mention SQL.";

/// NL-to-SQL engine: LLM generates SQL, the rewrite pass fixes it up, SQLite runs it
pub struct SqlQueryEngine {
    llm: Arc<dyn LLM>,
    db: Arc<Database>,
    config: LLMConfig,
}

impl SqlQueryEngine {
    pub fn new(llm: Arc<dyn LLM>, db: Arc<Database>, config: LLMConfig) -> Self {
        Self { llm, db, config }
    }

    async fn ask(&self, system: String, user: String) -> Result<String, ChatError> {
        let response = self
            .llm
            .chat(
                vec![LLMMessage::system(system), LLMMessage::user(user)],
                None,
                Some(self.config.temperature),
                self.config.max_tokens,
            )
            .await?;

        if let Some(usage) = response.usage {
            tracing::debug!(tokens = usage.total_tokens, model = %response.model, "LLM reply");
        }
        if response.truncated() {
            tracing::warn!("LLM reply hit the token limit");
        }
        Ok(response.content)
    }

    async fn generate_sql(&self, question: &str) -> Result<String, ChatError> {
        let system = format!("{}\n\n{}", self.config.system_prompt(), SCHEMA);
        let user = format!(
            "Question: {}\nReply with one SQLite SELECT statement only.",
            question
        );
        let reply = self.ask(system, user).await?;

        let sql = extract_sql(&reply);
        if sql.is_empty() {
            return Err(ChatError::Query("model returned no SQL".to_string()));
        }

        let sql = case_insensitive_property_type(&ensure_required_columns(&sql));
        if !is_read_only(&sql) {
            return Err(ChatError::Query(format!("refusing to run statement: {}", sql)));
        }
        Ok(sql)
    }

    async fn summarize(&self, question: &str, result: &NlQueryResult) -> String {
        if result.rows.is_empty() {
            return NO_ROWS_SUMMARY.to_string();
        }

        let sample: Vec<&serde_json::Map<String, Value>> = result.rows.iter().take(SUMMARY_ROWS).collect();
        let rows = serde_json::to_string(&sample).unwrap_or_default();
        let user = format!(
            "Question: {}\nRows returned: {}\nFirst rows: {}",
            question,
            result.rows.len(),
            rows
        );

        match self.ask(SUMMARY_PROMPT.to_string(), user).await {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => SUMMARY_FALLBACK.to_string(),
            Err(e) => {
                tracing::warn!("Summary request failed: {}", e);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

#[async_trait]
impl QueryEngine for SqlQueryEngine {
    async fn query(&self, question: &str) -> Result<NlQueryResult, ChatError> {
        let sql = self.generate_sql(question).await?;
        tracing::info!("SQL generated: {}", sql);

        let (columns, mut rows) = self.db.run_select(&sql)?;

        for row in rows.iter_mut() {
            if let Some(id) = row.get("id").and_then(Value::as_i64) {
                let images = self.db.images_for(id).await?;
                row.insert("property_images".to_string(), Value::from(images));
            }
        }

        let mut result = NlQueryResult {
            sql,
            columns,
            rows,
            chat_response: None,
        };
        result.chat_response = Some(self.summarize(question, &result).await);
        Ok(result)
    }

    async fn extract_filters(&self, question: &str) -> Result<SearchFilters, ChatError> {
        let reply = self.ask(INTENT_PROMPT.to_string(), question.to_string()).await?;
        let filters = parse_filters(&reply);
        tracing::debug!(filters = ?filters, "extracted filters");
        Ok(filters)
    }
}
