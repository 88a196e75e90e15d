//! Console adapter for development/testing

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::application::errors::ChatError;
use crate::application::formatter::money;
use crate::application::messaging::Dispatcher;
use crate::domain::entities::Response;

const PROMPT: &str = "you> ";
const MAX_LISTED: usize = 10;

/// Interactive chat loop over stdin/stdout
pub struct ConsoleAdapter {
    dispatcher: Arc<Dispatcher>,
    session_id: Option<String>,
    user_id: Option<i64>,
}

impl ConsoleAdapter {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            session_id: None,
            user_id: None,
        }
    }

    pub fn with_user(mut self, user_id: Option<i64>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Read lines until EOF or `/quit`; `/new` starts a fresh session
    pub async fn run(&mut self) -> Result<(), ChatError> {
        tracing::info!("Starting console chat (dev mode)");
        println!("Tourwise chat. Type /new for a new session, /quit to exit.");

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(PROMPT.as_bytes()).await.map_err(io_error)?;
            stdout.flush().await.map_err(io_error)?;

            let Some(line) = lines.next_line().await.map_err(io_error)? else {
                break;
            };
            let line = line.trim();

            match line {
                "" => continue,
                "/quit" | "/exit" => break,
                "/new" => {
                    self.session_id = None;
                    println!("[started a new session]");
                    continue;
                }
                _ => {}
            }

            match self
                .dispatcher
                .process(line, self.session_id.as_deref(), self.user_id)
                .await
            {
                Ok(outcome) => {
                    self.session_id = Some(outcome.session_id);
                    println!("{}", render(&outcome.response));
                }
                Err(e) => println!("[BOT] {}", e),
            }
        }

        Ok(())
    }
}

fn io_error(e: std::io::Error) -> ChatError {
    ChatError::Internal(format!("console I/O failed: {}", e))
}

/// Plain-text rendering of a reply and its listings
pub fn render(response: &Response) -> String {
    let mut out = format!("[BOT] {}", response.content);

    for listing in response.properties().iter().take(MAX_LISTED) {
        let field = |key: &str| listing.get(key).and_then(Value::as_str).unwrap_or_default();
        let price = listing
            .get("price")
            .and_then(Value::as_f64)
            .map(|p| money(p, 0))
            .unwrap_or_else(|| "price on request".to_string());

        out.push_str(&format!("\n  - {} ({}, {}) {}", field("title"), field("suburb"), field("city"), price));
        if let Some(km) = listing.get("distance_from_cbd").and_then(Value::as_f64) {
            out.push_str(&format!(", {} km from CBD", km));
        }
    }

    let hidden = response.property_count().saturating_sub(MAX_LISTED);
    if hidden > 0 {
        out.push_str(&format!("\n  ... and {} more", hidden));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::MessageType;
    use serde_json::json;

    #[test]
    fn test_render_lists_properties() {
        let response = Response::new("Found two", MessageType::PropertySearch).with_properties(vec![
            json!({"title": "Flat", "suburb": "Avondale", "city": "Harare", "price": 450.0, "distance_from_cbd": 3.2}),
            json!({"title": "House", "suburb": "Hillside", "city": "Bulawayo"}),
        ]);
        let text = render(&response);
        assert!(text.starts_with("[BOT] Found two"));
        assert!(text.contains("- Flat (Avondale, Harare) $450, 3.2 km from CBD"));
        assert!(text.contains("- House (Hillside, Bulawayo) price on request"));
    }
}
