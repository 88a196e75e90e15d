//! Chat service - sessions, the conversation log and retention

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::application::errors::ChatError;
use crate::domain::entities::{ChatSession, ConversationState, Sender, StoredMessage};
use crate::domain::traits::ChatStore;

const EVENT_CAPACITY: usize = 256;
const MAX_SESSION_ID_LEN: usize = 64;

/// Session lifetime and history limits
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub max_sessions_per_user: usize,
    pub history_limit: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(24),
            max_sessions_per_user: 10,
            history_limit: 100,
        }
    }
}

/// Outcome of a session-limit pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LimitReport {
    pub users_over_limit: usize,
    pub sessions_removed: usize,
}

pub struct ChatService {
    store: Arc<dyn ChatStore>,
    settings: SessionSettings,
    events: broadcast::Sender<StoredMessage>,
}

impl ChatService {
    pub fn new(store: Arc<dyn ChatStore>, settings: SessionSettings) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { store, settings, events }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// New listener for every message recorded from now on
    pub fn subscribe(&self) -> broadcast::Receiver<StoredMessage> {
        self.events.subscribe()
    }

    /// Resume a live session or start a new one.
    ///
    /// Unknown ids supplied by the client are adopted; expired sessions are
    /// deleted and replaced by a session with a fresh id.
    pub async fn get_or_create_session(
        &self,
        session_id: Option<&str>,
        user_id: Option<i64>,
    ) -> Result<ChatSession, ChatError> {
        let requested = session_id.map(str::trim).filter(|id| is_valid_session_id(id));

        if let Some(id) = requested {
            if let Some(mut session) = self.store.get_session(id).await? {
                if !session.is_expired(self.settings.ttl) {
                    if session.user_id.is_none() && user_id.is_some() {
                        session.user_id = user_id;
                        self.store.update_session(&session).await?;
                    }
                    return Ok(session);
                }
                tracing::info!("Session {} expired, starting a new one", id);
                self.store.delete_session(id).await?;
                return self.create_session(uuid::Uuid::new_v4().to_string(), user_id).await;
            }
            return self.create_session(id.to_string(), user_id).await;
        }

        self.create_session(uuid::Uuid::new_v4().to_string(), user_id).await
    }

    async fn create_session(&self, id: String, user_id: Option<i64>) -> Result<ChatSession, ChatError> {
        let session = ChatSession::new(id, user_id);
        self.store.insert_session(&session).await?;
        tracing::info!("Created chat session {}", session.id);

        if let Some(user_id) = user_id {
            self.trim_user_sessions(user_id, false).await?;
        }
        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<Option<ChatSession>, ChatError> {
        Ok(self.store.get_session(id).await?)
    }

    pub async fn list_sessions(&self, user_id: Option<i64>, limit: usize) -> Result<Vec<ChatSession>, ChatError> {
        Ok(self.store.list_sessions(user_id, limit).await?)
    }

    pub async fn delete_session(&self, id: &str) -> Result<bool, ChatError> {
        Ok(self.store.delete_session(id).await?)
    }

    /// Messages of a session, oldest first, capped at the configured history limit
    pub async fn history(&self, session_id: &str) -> Result<Vec<StoredMessage>, ChatError> {
        if self.store.get_session(session_id).await?.is_none() {
            return Err(ChatError::NotFound(format!("session {}", session_id)));
        }
        Ok(self
            .store
            .get_messages(session_id, Some(self.settings.history_limit))
            .await?)
    }

    pub async fn load_state(&self, session_id: &str) -> Result<ConversationState, ChatError> {
        Ok(self
            .store
            .get_state(session_id)
            .await?
            .unwrap_or_else(|| ConversationState::new(session_id)))
    }

    pub async fn save_state(&self, state: &ConversationState) -> Result<(), ChatError> {
        Ok(self.store.save_state(state).await?)
    }

    /// Append a message to the log and touch the session
    pub async fn record_message(
        &self,
        session: &mut ChatSession,
        sender: Sender,
        content: &str,
        message_type: &str,
        metadata: Value,
    ) -> Result<StoredMessage, ChatError> {
        let message = StoredMessage::new(session.id.clone(), sender, content, message_type, metadata);
        self.store.save_message(&message).await?;

        match sender {
            Sender::User if session.title.is_none() => session.title = Some(ChatSession::title_from(content)),
            Sender::Bot => session.has_ai_response = true,
            _ => {}
        }
        session.updated_at = Utc::now();
        self.store.update_session(session).await?;

        // Nobody listening is fine
        let _ = self.events.send(message.clone());
        Ok(message)
    }

    /// Delete sessions older than the TTL; returns how many were (or would be) removed
    pub async fn cleanup_expired(&self, dry_run: bool) -> Result<usize, ChatError> {
        let cutoff = Utc::now() - self.settings.ttl;
        let expired = self.store.sessions_created_before(cutoff).await?;

        if dry_run {
            tracing::info!("Dry run: {} expired sessions would be deleted", expired.len());
            return Ok(expired.len());
        }

        let mut removed = 0;
        for id in &expired {
            if self.store.delete_session(id).await? {
                removed += 1;
            }
        }
        tracing::info!("Deleted {} expired sessions", removed);
        Ok(removed)
    }

    /// Keep only the most recently updated sessions of every user
    pub async fn enforce_limits(&self, dry_run: bool) -> Result<LimitReport, ChatError> {
        let mut report = LimitReport::default();

        for user_id in self.store.users_with_sessions().await? {
            let removed = self.trim_user_sessions(user_id, dry_run).await?;
            if removed > 0 {
                report.users_over_limit += 1;
                report.sessions_removed += removed;
            }
        }

        tracing::info!(
            "{} {} sessions across {} users",
            if dry_run { "Would remove" } else { "Removed" },
            report.sessions_removed,
            report.users_over_limit
        );
        Ok(report)
    }

    async fn trim_user_sessions(&self, user_id: i64, dry_run: bool) -> Result<usize, ChatError> {
        let sessions = self.store.list_sessions(Some(user_id), usize::MAX).await?;
        let excess = sessions.get(self.settings.max_sessions_per_user..).unwrap_or(&[]);

        if !dry_run {
            for session in excess {
                tracing::debug!("Removing session {} of user {}", session.id, user_id);
                self.store.delete_session(&session.id).await?;
            }
        }
        Ok(excess.len())
    }
}

fn is_valid_session_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_SESSION_ID_LEN
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::database::Database;

    fn service() -> (ChatService, Arc<Database>) {
        let db = Arc::new(Database::in_memory().unwrap());
        let settings = SessionSettings {
            max_sessions_per_user: 2,
            ..Default::default()
        };
        (ChatService::new(db.clone(), settings), db)
    }

    #[tokio::test]
    async fn test_session_is_created_and_resumed() {
        let (service, _) = service();
        let first = service.get_or_create_session(None, None).await.unwrap();
        let again = service.get_or_create_session(Some(&first.id), Some(7)).await.unwrap();
        assert_eq!(first.id, again.id);
        assert_eq!(again.user_id, Some(7));

        let adopted = service.get_or_create_session(Some("client-abc"), None).await.unwrap();
        assert_eq!(adopted.id, "client-abc");

        let fresh = service.get_or_create_session(Some("bad id!"), None).await.unwrap();
        assert_ne!(fresh.id, "bad id!");
    }

    #[tokio::test]
    async fn test_expired_session_is_replaced() {
        let (service, db) = service();
        let mut old = ChatSession::new("old", None);
        old.created_at = Utc::now() - Duration::hours(30);
        db.insert_session(&old).await.unwrap();

        let session = service.get_or_create_session(Some("old"), None).await.unwrap();
        assert_ne!(session.id, "old");
        assert!(db.get_session("old").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_record_message_sets_title_and_notifies() {
        let (service, _) = service();
        let mut rx = service.subscribe();
        let mut session = service.get_or_create_session(None, None).await.unwrap();

        service
            .record_message(&mut session, Sender::User, "houses in Harare", "text", Value::Null)
            .await
            .unwrap();
        service
            .record_message(&mut session, Sender::Bot, "Here you go", "property_search", Value::Null)
            .await
            .unwrap();

        assert_eq!(session.title.as_deref(), Some("houses in Harare"));
        assert!(session.has_ai_response);
        assert_eq!(rx.recv().await.unwrap().content, "houses in Harare");

        let history = service.history(&session.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].sender, Sender::Bot);
        assert!(matches!(service.history("missing").await, Err(ChatError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_cleanup_dry_run_then_delete() {
        let (service, db) = service();
        for id in ["a", "b"] {
            let mut s = ChatSession::new(id, None);
            s.created_at = Utc::now() - Duration::hours(48);
            db.insert_session(&s).await.unwrap();
        }
        db.insert_session(&ChatSession::new("c", None)).await.unwrap();

        assert_eq!(service.cleanup_expired(true).await.unwrap(), 2);
        assert!(db.get_session("a").await.unwrap().is_some());

        assert_eq!(service.cleanup_expired(false).await.unwrap(), 2);
        assert!(db.get_session("a").await.unwrap().is_none());
        assert!(db.get_session("c").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_enforce_limits_keeps_most_recent() {
        let (service, db) = service();
        for (i, id) in ["s1", "s2", "s3", "s4"].iter().enumerate() {
            let mut s = ChatSession::new(*id, Some(1));
            s.updated_at = Utc::now() - Duration::minutes(10 - i as i64);
            db.insert_session(&s).await.unwrap();
        }

        let report = service.enforce_limits(true).await.unwrap();
        assert_eq!(report, LimitReport { users_over_limit: 1, sessions_removed: 2 });
        assert_eq!(db.list_sessions(Some(1), 10).await.unwrap().len(), 4);

        service.enforce_limits(false).await.unwrap();
        let left: Vec<String> = db.list_sessions(Some(1), 10).await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(left, vec!["s4", "s3"]);
    }
}
