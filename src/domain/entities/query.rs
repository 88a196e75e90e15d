use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Outcome of a natural-language query run through the SQL engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlQueryResult {
    pub sql: String,
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
    pub chat_response: Option<String>,
}

impl NlQueryResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Search intent extracted from free text by the LLM
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchFilters {
    pub city: Option<String>,
    pub suburb: Option<String>,
    #[serde(deserialize_with = "lenient_price")]
    pub max_price: Option<f64>,
    pub property_type: Option<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub amenities: Vec<String>,
    #[serde(deserialize_with = "lenient_list")]
    pub keywords: Vec<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.city.is_none()
            && self.suburb.is_none()
            && self.max_price.is_none()
            && self.property_type.is_none()
            && self.amenities.is_empty()
            && self.keywords.is_empty()
    }
}

// LLMs answer with "$500", 500 or null interchangeably
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => {
            let digits: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|v| v.as_str().map(|s| s.trim().to_string()))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
        _ => Vec::new(),
    })
}
