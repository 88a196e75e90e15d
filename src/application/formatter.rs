//! Response formatting for the web client and the message log

use serde_json::{json, Map, Value};

use crate::domain::entities::{MessageType, Response};

const MEDIA_PREFIX: &str = "/media/";

/// Shape a response the way the chat front end renders it
pub fn format_for_frontend(response: &Response) -> Value {
    if response.message_type == MessageType::Error {
        return json!({
            "error": response.error_message.clone().unwrap_or_else(|| response.content.clone()),
            "friendly_message": response.content,
        });
    }

    if response.message_type.is_conversational() {
        return json!({
            "friendly_message": response.content,
            "result": [],
            "is_conversational": true,
        });
    }

    let result = format_properties(response.properties());
    json!({
        "friendly_message": response.content,
        "property_count": result.len(),
        "result": result,
    })
}

/// Fill the fields every property card expects.
///
/// Rows without an `id` (aggregates, counts) are passed through untouched.
pub fn format_properties(rows: &[Value]) -> Vec<Value> {
    rows.iter()
        .map(|row| match row {
            Value::Object(map) if map.contains_key("id") => Value::Object(normalize_property(map)),
            other => other.clone(),
        })
        .collect()
}

fn normalize_property(row: &Map<String, Value>) -> Map<String, Value> {
    let mut out = row.clone();

    let text = |key: &str| -> Value {
        match row.get(key) {
            Some(Value::Null) | None => Value::from(""),
            Some(v) => v.clone(),
        }
    };

    out.insert("title".to_string(), match row.get("title") {
        Some(Value::String(t)) if !t.is_empty() => Value::from(t.as_str()),
        _ => Value::from("Property"),
    });
    for key in ["city", "suburb", "street_address", "description", "property_type"] {
        out.insert(key.to_string(), text(key));
    }
    for key in ["price", "bedrooms", "bathrooms", "area"] {
        out.insert(key.to_string(), row.get(key).cloned().unwrap_or(Value::Null));
    }

    let main_image = row.get("main_image").and_then(Value::as_str).unwrap_or_default();
    out.insert("main_image".to_string(), Value::from(media_url(main_image)));

    if !matches!(out.get("property_images"), Some(Value::Array(_))) {
        out.insert("property_images".to_string(), Value::Array(Vec::new()));
    }
    out
}

/// Prefix relative image paths with the media root
pub fn media_url(path: &str) -> String {
    if path.is_empty() || path.starts_with("http") || path.starts_with(MEDIA_PREFIX) {
        path.to_string()
    } else {
        format!("{}{}", MEDIA_PREFIX, path.trim_start_matches('/'))
    }
}

/// Metadata persisted with the bot's message
pub fn format_for_storage(response: &Response) -> Value {
    if response.data.is_some() {
        return json!({
            "property_count": response.property_count(),
            "properties": response.properties(),
        });
    }

    if !response.success {
        return json!({
            "error": response.error_message,
            "error_type": "processing_error",
        });
    }

    Value::Object(response.metadata.clone())
}

/// `$1,234` or `$1,234.50`
pub fn money(amount: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, amount.abs());
    let (whole, fraction) = match formatted.split_once('.') {
        Some((w, f)) => (w.to_string(), Some(f.to_string())),
        None => (formatted, None),
    };

    let mut grouped = String::new();
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    match fraction {
        Some(f) => format!("{}${}.{}", sign, grouped, f),
        None => format!("{}${}", sign, grouped),
    }
}
