//! Session state and per-session turn handling
//!
//! A session is loaded, worked on as a copy, and written back only when the
//! whole turn (pipeline, reply, save) has gone through. Turns on the same
//! session are serialized; different sessions proceed independently.

use crate::orchestrator::{TurnInput, TurnOutcome, TurnProcessor};
use crate::reply::{generate_with_timeout, pick_fallback, EngagementPhase, ReplyGenerator, ReplyRequest};
use crate::state_machine::ConversationStateMachine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use scamshield_config::AgentSettings;
use scamshield_core::{
    ConversationEvent, ConversationMessage, ConversationState, Error, Result, ScamCategory,
    SessionIntelligence, TransitionRecord,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Everything persisted for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    pub state: ConversationState,
    pub intelligence: SessionIntelligence,
    pub turn_count: u32,
    /// Most confident scam category seen so far
    pub scam_category: ScamCategory,
    pub scam_confidence: f32,
    /// Recently used stall phrase indices
    pub used_fallbacks: Vec<usize>,
    pub history: Vec<ConversationMessage>,
    pub transitions: Vec<TransitionRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            session_id: session_id.into(),
            state: ConversationState::Initial,
            intelligence: SessionIntelligence::new(),
            turn_count: 0,
            scam_category: ScamCategory::Unknown,
            scam_confidence: 0.0,
            used_fallbacks: Vec::new(),
            history: Vec::new(),
            transitions: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Last `window` messages, oldest first
    pub fn recent_history(&self, window: usize) -> &[ConversationMessage] {
        let start = self.history.len().saturating_sub(window);
        &self.history[start..]
    }

    pub fn is_closed(&self) -> bool {
        self.state.is_terminal()
    }
}

/// Session persistence backend
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>>;

    async fn save(&self, session: &SessionState) -> Result<()>;

    async fn delete(&self, session_id: &str) -> Result<()>;

    async fn list_ids(&self) -> Result<Vec<String>>;
}

/// Process-local store; nothing survives a restart
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionState>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> Result<Option<SessionState>> {
        Ok(self.sessions.read().get(session_id).cloned())
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        self.sessions
            .write()
            .insert(session.session_id.clone(), session.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.sessions.write().remove(session_id);
        Ok(())
    }

    async fn list_ids(&self) -> Result<Vec<String>> {
        Ok(self.sessions.read().keys().cloned().collect())
    }
}

/// Result of handling one scammer message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnReply {
    pub session_id: String,
    pub turn_count: u32,
    pub reply: String,
    /// The reply is a stall phrase because the generator failed
    pub used_fallback: bool,
    pub outcome: TurnOutcome,
}

/// Routes messages to sessions and commits each turn atomically
pub struct SessionRegistry {
    processor: Arc<TurnProcessor>,
    store: Arc<dyn SessionStore>,
    generator: Arc<dyn ReplyGenerator>,
    settings: AgentSettings,
    locks: RwLock<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SessionRegistry {
    pub fn new(
        processor: Arc<TurnProcessor>,
        store: Arc<dyn SessionStore>,
        generator: Arc<dyn ReplyGenerator>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            processor,
            store,
            generator,
            settings,
            locks: RwLock::new(HashMap::new()),
        }
    }

    /// Fresh random session id
    pub fn create_session_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn processor(&self) -> &TurnProcessor {
        &self.processor
    }

    /// Per-session locks currently held or awaited
    pub fn active_locks(&self) -> usize {
        self.locks.read().len()
    }

    fn lock_for(&self, session_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        if let Some(lock) = self.locks.read().get(session_id) {
            return Arc::clone(lock);
        }
        Arc::clone(
            self.locks
                .write()
                .entry(session_id.to_string())
                .or_default(),
        )
    }

    /// Drop the map entry once only the map and `lock` refer to it
    ///
    /// Must be called after the guard is released. New callers reach the
    /// mutex through the map, so holding the write lock here excludes them.
    fn release_lock(&self, session_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self.locks.write();
        let ours = locks
            .get(session_id)
            .map_or(false, |current| Arc::ptr_eq(current, &lock));
        if ours && Arc::strong_count(&lock) == 2 {
            locks.remove(session_id);
        }
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<SessionState>> {
        self.store.load(session_id).await
    }

    /// Run one turn for `session_id`, creating the session on first contact
    ///
    /// Fails with [`Error::SessionClosed`] once the session reached a terminal
    /// state. A failed save leaves the stored session untouched.
    pub async fn handle_message(&self, session_id: &str, message: &str) -> Result<TurnReply> {
        let lock = self.lock_for(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.run_turn(session_id, message).await
        };
        self.release_lock(session_id, lock);
        result
    }

    async fn run_turn(&self, session_id: &str, message: &str) -> Result<TurnReply> {
        let current = match self.store.load(session_id).await? {
            Some(session) => session,
            None => {
                tracing::info!(session_id, "New session");
                SessionState::new(session_id)
            }
        };
        if current.is_closed() {
            return Err(Error::SessionClosed(session_id.to_string()));
        }

        let mut next = current.clone();
        next.turn_count = current.turn_count.saturating_add(1);

        let outcome = self.processor.process_turn(&TurnInput {
            scammer_message: message,
            turn_count: next.turn_count,
            prior_intelligence: &current.intelligence,
            threat_check_message: None,
            current_state: current.state,
            history: &current.history,
        });

        let classification = &outcome.classification;
        if classification.is_scam && classification.confidence >= next.scam_confidence {
            next.scam_category = classification.category;
            next.scam_confidence = classification.confidence;
        }
        next.intelligence = outcome.merged_intelligence.clone();
        next.state = outcome.next_state;
        next.transitions.extend(outcome.transitions.iter().cloned());

        let request = ReplyRequest {
            session_id: session_id.to_string(),
            scammer_message: message.to_string(),
            turn_count: next.turn_count,
            phase: EngagementPhase::from_turn(next.turn_count),
            priorities: outcome.priorities.clone(),
            category: next.scam_category,
            history: current.recent_history(self.settings.history_window).to_vec(),
        };

        let (reply, used_fallback) = match generate_with_timeout(
            self.generator.as_ref(),
            &request,
            self.settings.reply_timeout_ms,
        )
        .await
        {
            Ok(reply) => (reply, false),
            Err(e) => {
                tracing::warn!(
                    session_id,
                    generator = self.generator.name(),
                    error = %e,
                    "Reply generation failed, using stall phrase"
                );
                (fallback_reply(&mut next.used_fallbacks), true)
            }
        };

        next.history.push(ConversationMessage::scammer(message));
        next.history.push(ConversationMessage::agent(reply.clone()));
        next.updated_at = Utc::now();

        if let Err(e) = self.store.save(&next).await {
            tracing::error!(session_id, turn = next.turn_count, error = %e, "Failed to save session");
            return Err(e);
        }

        tracing::info!(
            session_id,
            turn = next.turn_count,
            state = %next.state,
            entities = next.intelligence.total_entities(),
            used_fallback,
            "Turn committed"
        );

        Ok(TurnReply {
            session_id: session_id.to_string(),
            turn_count: next.turn_count,
            reply,
            used_fallback,
            outcome,
        })
    }

    /// Close a session by operator request
    pub async fn terminate(&self, session_id: &str) -> Result<SessionState> {
        let lock = self.lock_for(session_id);
        let result = {
            let _guard = lock.lock().await;
            self.close_session(session_id).await
        };
        self.release_lock(session_id, lock);
        result
    }

    async fn close_session(&self, session_id: &str) -> Result<SessionState> {
        let mut session = self
            .store
            .load(session_id)
            .await?
            .ok_or_else(|| Error::SessionNotFound(session_id.to_string()))?;
        if session.is_closed() {
            return Ok(session);
        }

        let mut machine = ConversationStateMachine::with_state(session.state);
        session.state = machine.fire(ConversationEvent::ManualTerminate);
        session.transitions.extend(machine.take_history());
        session.updated_at = Utc::now();

        self.store.save(&session).await?;
        tracing::info!(session_id, turns = session.turn_count, "Session terminated");
        Ok(session)
    }
}

fn fallback_reply(used: &mut Vec<usize>) -> String {
    pick_fallback(used, &mut rand::thread_rng()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = InMemorySessionStore::new();
        assert!(store.is_empty());
        assert!(store.load("a").await.unwrap().is_none());

        let mut session = SessionState::new("a");
        session.turn_count = 3;
        store.save(&session).await.unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.load("a").await.unwrap(), Some(session));
        assert_eq!(store.list_ids().await.unwrap(), vec!["a".to_string()]);

        store.delete("a").await.unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_recent_history() {
        let mut session = SessionState::new("a");
        assert!(session.recent_history(4).is_empty());
        for i in 0..6 {
            session.history.push(ConversationMessage::scammer(format!("m{}", i)));
        }
        let recent = session.recent_history(4);
        assert_eq!(recent.len(), 4);
        assert_eq!(recent[0].content, "m2");
        assert_eq!(session.recent_history(10).len(), 6);
    }

    #[test]
    fn test_new_session_defaults() {
        let session = SessionState::new("abc");
        assert_eq!(session.state, ConversationState::Initial);
        assert_eq!(session.turn_count, 0);
        assert_eq!(session.scam_category, ScamCategory::Unknown);
        assert!(!session.is_closed());
        assert_ne!(SessionRegistry::create_session_id(), SessionRegistry::create_session_id());
    }
}
