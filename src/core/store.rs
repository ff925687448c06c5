//! Session persistence
//!
//! The service keeps no debate state of its own; every command loads the
//! session, applies an engine operation and saves it back.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::{EngineError, Result};
use crate::types::{AudioTurn, InterruptionRecord, SessionState, Verdict};

/// Shared reference to a store
pub type SharedStore = Arc<dyn SessionStore>;

/// Storage for sessions and their verdicts
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a session by debate id
    async fn get(&self, debate_id: &str) -> Result<SessionState>;

    /// Insert or replace a session
    async fn save(&self, session: &SessionState) -> Result<()>;

    /// Drop a session and its verdict
    async fn remove(&self, debate_id: &str) -> Result<()>;

    /// Known debate ids, sorted
    async fn list_ids(&self) -> Vec<String>;

    async fn append_audio_turn(&self, debate_id: &str, turn: AudioTurn) -> Result<()>;

    async fn append_interruption(&self, debate_id: &str, record: InterruptionRecord) -> Result<()>;

    async fn save_judgment(&self, debate_id: &str, verdict: &Verdict) -> Result<()>;

    /// Verdict, if judging has finished
    async fn get_judgment(&self, debate_id: &str) -> Result<Option<Verdict>>;
}

#[derive(Debug, Clone)]
struct StoredDebate {
    session: SessionState,
    verdict: Option<Verdict>,
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    debates: RwLock<HashMap<String, StoredDebate>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shared reference to this store
    pub fn shared(self) -> SharedStore {
        Arc::new(self)
    }
}

fn not_found(debate_id: &str) -> EngineError {
    EngineError::SessionNotFound(debate_id.to_string())
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, debate_id: &str) -> Result<SessionState> {
        self.debates
            .read()
            .await
            .get(debate_id)
            .map(|d| d.session.clone())
            .ok_or_else(|| not_found(debate_id))
    }

    async fn save(&self, session: &SessionState) -> Result<()> {
        let mut debates = self.debates.write().await;
        match debates.get_mut(session.id()) {
            Some(stored) => stored.session = session.clone(),
            None => {
                debates.insert(
                    session.id().to_string(),
                    StoredDebate {
                        session: session.clone(),
                        verdict: None,
                    },
                );
            }
        }
        Ok(())
    }

    async fn remove(&self, debate_id: &str) -> Result<()> {
        self.debates
            .write()
            .await
            .remove(debate_id)
            .map(|_| ())
            .ok_or_else(|| not_found(debate_id))
    }

    async fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.debates.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn append_audio_turn(&self, debate_id: &str, turn: AudioTurn) -> Result<()> {
        let mut debates = self.debates.write().await;
        let stored = debates.get_mut(debate_id).ok_or_else(|| not_found(debate_id))?;
        stored.session.push_audio_turn(turn);
        Ok(())
    }

    async fn append_interruption(&self, debate_id: &str, record: InterruptionRecord) -> Result<()> {
        let mut debates = self.debates.write().await;
        let stored = debates.get_mut(debate_id).ok_or_else(|| not_found(debate_id))?;
        stored.session.push_interruption(record);
        Ok(())
    }

    async fn save_judgment(&self, debate_id: &str, verdict: &Verdict) -> Result<()> {
        let mut debates = self.debates.write().await;
        let stored = debates.get_mut(debate_id).ok_or_else(|| not_found(debate_id))?;
        stored.verdict = Some(verdict.clone());
        Ok(())
    }

    async fn get_judgment(&self, debate_id: &str) -> Result<Option<Verdict>> {
        self.debates
            .read()
            .await
            .get(debate_id)
            .map(|d| d.verdict.clone())
            .ok_or_else(|| not_found(debate_id))
    }
}
