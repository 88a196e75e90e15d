use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::MessageType;

/// Structured payload carried by search responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseData {
    pub properties: Vec<Value>,
}

/// Reply produced by exactly one capability per message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub content: String,
    pub message_type: MessageType,
    pub data: Option<ResponseData>,
    pub metadata: Map<String, Value>,
    pub success: bool,
    pub error_message: Option<String>,
}

impl Response {
    pub fn new(content: impl Into<String>, message_type: MessageType) -> Self {
        Self {
            content: content.into(),
            message_type,
            data: None,
            metadata: Map::new(),
            success: true,
            error_message: None,
        }
    }

    pub fn conversational(content: impl Into<String>) -> Self {
        Self::new(content, MessageType::Conversational)
    }

    /// Uniform error-classified response
    pub fn error(content: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            message_type: MessageType::Error,
            data: None,
            metadata: Map::new(),
            success: false,
            error_message: Some(error_message.into()),
        }
    }

    /// Attach listings and keep `property_count` in sync
    pub fn with_properties(mut self, properties: Vec<Value>) -> Self {
        self.metadata
            .insert("property_count".to_string(), Value::from(properties.len()));
        self.data = Some(ResponseData { properties });
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn properties(&self) -> &[Value] {
        self.data
            .as_ref()
            .map(|d| d.properties.as_slice())
            .unwrap_or(&[])
    }

    pub fn property_count(&self) -> usize {
        self.properties().len()
    }
}
