use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row};

use super::{encode_time, time_column, Database};
use crate::application::errors::StorageError;
use crate::domain::entities::{ChatSession, ConversationState, Sender, StoredMessage};
use crate::domain::traits::ChatStore;

const SESSION_COLUMNS: &str = "id, user_id, title, created_at, updated_at, is_active, has_ai_response";

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<ChatSession> {
    Ok(ChatSession {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        created_at: time_column(row, 3)?,
        updated_at: time_column(row, 4)?,
        is_active: row.get(5)?,
        has_ai_response: row.get(6)?,
    })
}

#[async_trait]
impl ChatStore for Database {
    async fn insert_session(&self, session: &ChatSession) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chat_sessions (id, user_id, title, created_at, updated_at, is_active, has_ai_response)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                session.id,
                session.user_id,
                session.title,
                encode_time(&session.created_at),
                encode_time(&session.updated_at),
                session.is_active,
                session.has_ai_response,
            ],
        )?;
        Ok(())
    }

    async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, StorageError> {
        let conn = self.lock()?;
        let session = conn
            .query_row(
                &format!("SELECT {} FROM chat_sessions WHERE id = ?1", SESSION_COLUMNS),
                [id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    async fn update_session(&self, session: &ChatSession) -> Result<(), StorageError> {
        let conn = self.lock()?;
        conn.execute(
            "UPDATE chat_sessions SET user_id = ?2, title = ?3, updated_at = ?4, is_active = ?5, has_ai_response = ?6
             WHERE id = ?1",
            rusqlite::params![
                session.id,
                session.user_id,
                session.title,
                encode_time(&session.updated_at),
                session.is_active,
                session.has_ai_response,
            ],
        )?;
        Ok(())
    }

    async fn list_sessions(&self, user_id: Option<i64>, limit: usize) -> Result<Vec<ChatSession>, StorageError> {
        let conn = self.lock()?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let sessions = match user_id {
            Some(user_id) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM chat_sessions WHERE user_id = ?1 AND is_active = 1
                     ORDER BY updated_at DESC LIMIT ?2",
                    SESSION_COLUMNS
                ))?;
                let rows = stmt.query_map(rusqlite::params![user_id, limit], session_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {} FROM chat_sessions WHERE is_active = 1
                     ORDER BY updated_at DESC LIMIT ?1",
                    SESSION_COLUMNS
                ))?;
                let rows = stmt.query_map([limit], session_from_row)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(sessions)
    }

    async fn delete_session(&self, id: &str) -> Result<bool, StorageError> {
        let conn = self.lock()?;
        let rows = conn.execute("DELETE FROM chat_sessions WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }

    async fn sessions_created_before(&self, cutoff: DateTime<Utc>) -> Result<Vec<String>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT id FROM chat_sessions WHERE created_at < ?1 ORDER BY created_at")?;
        let ids = stmt
            .query_map([encode_time(&cutoff)], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(ids)
    }

    async fn users_with_sessions(&self) -> Result<Vec<i64>, StorageError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT user_id FROM chat_sessions WHERE user_id IS NOT NULL ORDER BY user_id",
        )?;
        let users = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(users)
    }

    async fn save_message(&self, message: &StoredMessage) -> Result<(), StorageError> {
        let metadata = serde_json::to_string(&message.metadata)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO chat_messages (id, session_id, sender, content, message_type, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                message.id,
                message.session_id,
                message.sender.as_str(),
                message.content,
                message.message_type,
                metadata,
                encode_time(&message.created_at),
            ],
        )?;
        Ok(())
    }

    async fn get_messages(&self, session_id: &str, limit: Option<usize>) -> Result<Vec<StoredMessage>, StorageError> {
        let raw = {
            let conn = self.lock()?;
            // Newest first so LIMIT keeps the most recent entries; reversed below
            let mut stmt = conn.prepare(
                "SELECT id, session_id, sender, content, message_type, metadata, created_at
                 FROM chat_messages WHERE session_id = ?1
                 ORDER BY created_at DESC, rowid DESC LIMIT ?2",
            )?;
            let limit = limit.map(|l| l as i64).unwrap_or(-1);
            let rows = stmt.query_map(rusqlite::params![session_id, limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    time_column(row, 6)?,
                ))
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut messages = Vec::with_capacity(raw.len());
        for (id, session_id, sender, content, message_type, metadata, created_at) in raw.into_iter().rev() {
            messages.push(StoredMessage {
                id,
                session_id,
                sender: Sender::parse(&sender).unwrap_or(Sender::System),
                content,
                message_type,
                metadata: serde_json::from_str(&metadata)?,
                created_at,
            });
        }
        Ok(messages)
    }

    async fn get_state(&self, session_id: &str) -> Result<Option<ConversationState>, StorageError> {
        let raw = {
            let conn = self.lock()?;
            conn.query_row(
                "SELECT waiting_for_location, waiting_for_cbd_clarification, pending_search_query,
                        suggested_cbds, selected_cbd
                 FROM conversation_states WHERE session_id = ?1",
                [session_id],
                |row| {
                    Ok((
                        row.get::<_, bool>(0)?,
                        row.get::<_, bool>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<i64>>(4)?,
                    ))
                },
            )
            .optional()?
        };

        let Some((waiting_for_location, waiting_for_cbd_clarification, pending, suggested, selected)) = raw else {
            return Ok(None);
        };

        Ok(Some(ConversationState {
            session_id: session_id.to_string(),
            waiting_for_location,
            waiting_for_cbd_clarification,
            pending_search_query: pending,
            suggested_cbds: serde_json::from_str(&suggested)?,
            selected_cbd: selected,
        }))
    }

    async fn save_state(&self, state: &ConversationState) -> Result<(), StorageError> {
        let suggested = serde_json::to_string(&state.suggested_cbds)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO conversation_states (
                session_id, waiting_for_location, waiting_for_cbd_clarification,
                pending_search_query, suggested_cbds, selected_cbd, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(session_id) DO UPDATE SET
                waiting_for_location = excluded.waiting_for_location,
                waiting_for_cbd_clarification = excluded.waiting_for_cbd_clarification,
                pending_search_query = excluded.pending_search_query,
                suggested_cbds = excluded.suggested_cbds,
                selected_cbd = excluded.selected_cbd,
                updated_at = excluded.updated_at",
            rusqlite::params![
                state.session_id,
                state.waiting_for_location,
                state.waiting_for_cbd_clarification,
                state.pending_search_query,
                suggested,
                state.selected_cbd,
                encode_time(&Utc::now()),
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CbdSuggestion;
    use chrono::Duration;
    use serde_json::json;

    #[tokio::test]
    async fn test_session_round_trip() {
        let db = Database::in_memory().unwrap();
        let mut session = ChatSession::new("s-1", Some(7));
        db.insert_session(&session).await.unwrap();

        session.title = Some("houses in Harare".to_string());
        session.has_ai_response = true;
        db.update_session(&session).await.unwrap();

        let loaded = db.get_session("s-1").await.unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("houses in Harare"));
        assert!(loaded.has_ai_response);
        assert_eq!(loaded.user_id, Some(7));
        assert!(db.get_session("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_messages_keep_order_and_limit() {
        let db = Database::in_memory().unwrap();
        db.insert_session(&ChatSession::new("s-1", None)).await.unwrap();

        for i in 0..5 {
            let msg = StoredMessage::new("s-1", Sender::User, format!("msg {}", i), "conversational", json!({}));
            db.save_message(&msg).await.unwrap();
        }

        let all = db.get_messages("s-1", None).await.unwrap();
        assert_eq!(all.len(), 5);
        assert_eq!(all[0].content, "msg 0");

        let recent = db.get_messages("s-1", Some(2)).await.unwrap();
        let contents: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["msg 3", "msg 4"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_to_messages_and_state() {
        let db = Database::in_memory().unwrap();
        db.insert_session(&ChatSession::new("s-1", None)).await.unwrap();
        db.save_message(&StoredMessage::new("s-1", Sender::Bot, "hi", "greeting", json!({})))
            .await
            .unwrap();
        let mut state = ConversationState::new("s-1");
        state.waiting_for_location = true;
        db.save_state(&state).await.unwrap();

        assert!(db.delete_session("s-1").await.unwrap());
        assert!(!db.delete_session("s-1").await.unwrap());
        assert!(db.get_messages("s-1", None).await.unwrap().is_empty());
        assert!(db.get_state("s-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_upsert() {
        let db = Database::in_memory().unwrap();
        db.insert_session(&ChatSession::new("s-1", None)).await.unwrap();

        let mut state = ConversationState::new("s-1");
        state.waiting_for_cbd_clarification = true;
        state.pending_search_query = "apartments near cbd".to_string();
        state.suggested_cbds = vec![CbdSuggestion { id: 3, name: "Harare CBD".to_string(), city: "Harare".to_string() }];
        db.save_state(&state).await.unwrap();
        assert_eq!(db.get_state("s-1").await.unwrap(), Some(state.clone()));

        state.reset();
        db.save_state(&state).await.unwrap();
        let loaded = db.get_state("s-1").await.unwrap().unwrap();
        assert!(!loaded.is_awaiting_reply());
        assert!(loaded.suggested_cbds.is_empty());
    }

    #[tokio::test]
    async fn test_sessions_created_before() {
        let db = Database::in_memory().unwrap();
        let mut old = ChatSession::new("old", Some(1));
        old.created_at = Utc::now() - Duration::hours(30);
        db.insert_session(&old).await.unwrap();
        db.insert_session(&ChatSession::new("new", Some(1))).await.unwrap();

        let expired = db.sessions_created_before(Utc::now() - Duration::hours(24)).await.unwrap();
        assert_eq!(expired, vec!["old".to_string()]);
        assert_eq!(db.users_with_sessions().await.unwrap(), vec![1]);
    }
}
