//! Debate service: serialises commands, fans out events, drives judging
//!
//! Each debate has its own command lock; every mutation runs under it: load
//! from the store, apply an engine operation, save, broadcast. Debates never
//! wait on each other. Transcription is the only slow step and runs with the
//! lock released.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::{broadcast, Mutex, OwnedMutexGuard, RwLock};

use crate::core::arbiter;
use crate::core::engine;
use crate::core::ingest::{self, InterruptionAskSubmission, SpeechSubmission};
use crate::core::judge::JudgeService;
use crate::core::store::SharedStore;
use crate::core::transcription::Transcriber;
use crate::error::{EngineError, Result};
use crate::types::{
    AudioTurn, DebateConfig, DebateEvent, InterruptionRecord, Phase, Player, ReasonCode,
    SessionState, StateSnapshot, Team, Transition, Verdict,
};

/// Events buffered per debate before slow subscribers lag
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Request body for a new debate; unset timings take the defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDebate {
    #[serde(default)]
    pub debate_id: Option<String>,
    pub topic: String,
    #[serde(default = "default_team_size")]
    pub team_size: u32,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub discussion_secs: Option<u32>,
    #[serde(default)]
    pub speech_secs: Option<u32>,
    #[serde(default)]
    pub conclusion_secs: Option<u32>,
    #[serde(default)]
    pub interruption_ask_secs: Option<u32>,
    #[serde(default)]
    pub interruption_early_window_secs: Option<u32>,
    #[serde(default)]
    pub max_interruptions_per_team: Option<u32>,
}

fn default_team_size() -> u32 {
    1
}

impl CreateDebate {
    pub fn new(topic: impl Into<String>, team_size: u32) -> Self {
        Self {
            debate_id: None,
            topic: topic.into(),
            team_size,
            players: Vec::new(),
            discussion_secs: None,
            speech_secs: None,
            conclusion_secs: None,
            interruption_ask_secs: None,
            interruption_early_window_secs: None,
            max_interruptions_per_team: None,
        }
    }

    /// Same phase length for every phase; handy for tests and demos
    pub fn with_uniform_timings(mut self, secs: u32) -> Self {
        self.discussion_secs = Some(secs);
        self.speech_secs = Some(secs);
        self.conclusion_secs = Some(secs);
        self.interruption_ask_secs = Some(secs);
        self
    }

    fn into_parts(self) -> (DebateConfig, Vec<Player>) {
        let id = self
            .debate_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut config = DebateConfig::new(id, self.topic, self.team_size);
        if let Some(secs) = self.discussion_secs {
            config.discussion_secs = secs;
        }
        if let Some(secs) = self.speech_secs {
            config.speech_secs = secs;
        }
        if let Some(secs) = self.conclusion_secs {
            config.conclusion_secs = secs;
        }
        if let Some(secs) = self.interruption_ask_secs {
            config.interruption_ask_secs = secs;
        }
        if let Some(secs) = self.interruption_early_window_secs {
            config.interruption_early_window_secs = secs;
        }
        if let Some(max) = self.max_interruptions_per_team {
            config.max_interruptions_per_team = max;
        }
        (config, self.players)
    }
}

/// Shared reference to the service
pub type SharedService = Arc<DebateService>;

/// Orchestrates engine operations over stored sessions
#[derive(Clone)]
pub struct DebateService {
    store: SharedStore,
    transcriber: Arc<dyn Transcriber>,
    judges: JudgeService,
    channels: Arc<RwLock<HashMap<String, broadcast::Sender<DebateEvent>>>>,
    /// Command lock per debate
    locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl DebateService {
    pub fn new(store: SharedStore, transcriber: Arc<dyn Transcriber>, judges: JudgeService) -> Self {
        Self {
            store,
            transcriber,
            judges,
            channels: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Create a shared reference to this service
    pub fn shared(self) -> SharedService {
        Arc::new(self)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub async fn snapshot(&self, debate_id: &str) -> Result<StateSnapshot> {
        Ok(StateSnapshot::of(&self.store.get(debate_id).await?))
    }

    pub async fn state(&self, debate_id: &str) -> Result<SessionState> {
        self.store.get(debate_id).await
    }

    /// Stored verdict, `None` while judging is pending
    pub async fn judgment(&self, debate_id: &str) -> Result<Option<Verdict>> {
        self.store.get_judgment(debate_id).await
    }

    pub async fn list(&self) -> Vec<String> {
        self.store.list_ids().await
    }

    /// Realtime events for one debate
    pub async fn subscribe(&self, debate_id: &str) -> Result<broadcast::Receiver<DebateEvent>> {
        self.store.get(debate_id).await?;
        let mut channels = self.channels.write().await;
        let sender = channels
            .entry(debate_id.to_string())
            .or_insert_with(|| broadcast::channel(EVENT_CHANNEL_CAPACITY).0);
        Ok(sender.subscribe())
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// New session in LOBBY
    pub async fn create(&self, request: CreateDebate) -> Result<StateSnapshot> {
        let (config, players) = request.into_parts();
        let session = SessionState::new(config, players)?;

        let mut locks = self.locks.lock().await;
        if self.store.get(session.id()).await.is_ok() {
            return Err(EngineError::InvalidConfig(format!(
                "debate {} already exists",
                session.id()
            )));
        }
        self.store.save(&session).await?;
        locks.insert(session.id().to_string(), Arc::new(Mutex::new(())));
        drop(locks);
        self.channels.write().await.insert(
            session.id().to_string(),
            broadcast::channel(EVENT_CHANNEL_CAPACITY).0,
        );
        tracing::info!(
            debate_id = session.id(),
            topic = %session.config.topic,
            team_size = session.config.team_size,
            "debate created"
        );
        Ok(StateSnapshot::of(&session))
    }

    pub async fn start(&self, debate_id: &str) -> Result<StateSnapshot> {
        let (_, session) = self.apply(debate_id, engine::start).await?;
        Ok(StateSnapshot::of(&session))
    }

    /// Open an ask window for `team`; the speech clock pauses
    pub async fn request_interrupt(&self, debate_id: &str, team: Team) -> Result<StateSnapshot> {
        let (_, session) = self
            .apply(debate_id, |s| arbiter::start_interruption_ask(s, team))
            .await?;
        self.publish(
            debate_id,
            DebateEvent::InterruptionStarted {
                by: team,
                seconds: session.remaining,
            },
        )
        .await;
        Ok(StateSnapshot::of(&session))
    }

    /// Speaker declines to yield
    pub async fn reject_interrupt(&self, debate_id: &str) -> Result<StateSnapshot> {
        let (by, session) = self
            .apply(debate_id, |s| {
                let by = s.interruption_state.as_ref().map(|i| i.by);
                arbiter::reject_interruption(s)?;
                by.ok_or(EngineError::NoInterruptionPending)
            })
            .await?;
        self.publish(debate_id, DebateEvent::InterruptionRejected { by }).await;
        Ok(StateSnapshot::of(&session))
    }

    /// Interrupter finished early
    pub async fn end_interrupt(&self, debate_id: &str) -> Result<StateSnapshot> {
        let (_, session) = self.apply(debate_id, arbiter::end_interruption_ask).await?;
        self.publish(debate_id, DebateEvent::InterruptionEnded).await;
        Ok(StateSnapshot::of(&session))
    }

    /// Check the floor, transcribe with the lock released, append
    pub async fn submit_speech(&self, debate_id: &str, submission: SpeechSubmission) -> Result<AudioTurn> {
        {
            let _guard = self.lock_debate(debate_id).await?;
            let session = self.store.get(debate_id).await?;
            ingest::check_speech(&session, &submission)?;
        }

        let transcription = self.transcriber.transcribe(&submission.source).await?;

        let _guard = self.lock_debate(debate_id).await?;
        let mut session = self.live_session(debate_id, "speech").await?;
        let turn = ingest::record_speech(&mut session, submission, transcription);
        self.store.append_audio_turn(debate_id, turn.clone()).await?;
        tracing::info!(
            debate_id,
            team = %turn.team,
            phase = %turn.phase,
            duration_ms = turn.duration_ms,
            "speech recorded"
        );
        Ok(turn)
    }

    /// Check the ask window, transcribe with the lock released, append
    pub async fn submit_interruption_ask(
        &self,
        debate_id: &str,
        submission: InterruptionAskSubmission,
    ) -> Result<InterruptionRecord> {
        {
            let _guard = self.lock_debate(debate_id).await?;
            let session = self.store.get(debate_id).await?;
            ingest::check_interruption_ask(&session, submission.team)?;
        }

        let transcription = self.transcriber.transcribe(&submission.source).await?;

        let _guard = self.lock_debate(debate_id).await?;
        let mut session = self.live_session(debate_id, "interruption question").await?;
        let record = ingest::record_interruption_ask(&mut session, submission, transcription);
        self.store.append_interruption(debate_id, record.clone()).await?;
        tracing::info!(debate_id, team = %record.by, "interruption question recorded");
        Ok(record)
    }

    /// Judge now if the debate is waiting for a verdict; return the stored
    /// verdict once complete
    pub async fn judge(&self, debate_id: &str) -> Result<Verdict> {
        let session = self.store.get(debate_id).await?;
        match session.phase {
            Phase::Judging => self.run_judging(debate_id).await,
            Phase::Complete => self
                .store
                .get_judgment(debate_id)
                .await?
                .ok_or(EngineError::InvalidPhase {
                    operation: "judge",
                    phase: Phase::Complete,
                }),
            phase => Err(EngineError::InvalidPhase {
                operation: "judge",
                phase,
            }),
        }
    }

    /// Drop a debate; late transcriptions for it are discarded
    pub async fn close(&self, debate_id: &str) -> Result<()> {
        let _guard = self.lock_debate(debate_id).await?;
        self.store.remove(debate_id).await?;
        self.locks.lock().await.remove(debate_id);
        self.channels.write().await.remove(debate_id);
        tracing::info!(debate_id, "debate closed");
        Ok(())
    }

    /// One second for every running debate. Returns how many ticked.
    pub async fn tick_all(&self) -> usize {
        let mut ticked = 0;
        for debate_id in self.store.list_ids().await {
            match self.tick_one(&debate_id).await {
                Ok(true) => ticked += 1,
                // closed since listing
                Ok(false) | Err(EngineError::SessionNotFound(_)) => {}
                Err(e) => tracing::warn!(debate_id = %debate_id, error = %e, "tick failed"),
            }
        }
        ticked
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    async fn tick_one(&self, debate_id: &str) -> Result<bool> {
        let _guard = self.lock_debate(debate_id).await?;
        let mut session = self.store.get(debate_id).await?;
        if !session.phase.is_ticking() {
            return Ok(false);
        }
        let transition = engine::tick(&mut session);
        self.store.save(&session).await?;
        self.publish(debate_id, DebateEvent::State(StateSnapshot::of(&session))).await;

        if let Some(transition) = transition {
            self.after_transition(debate_id, &transition).await;
        }
        Ok(true)
    }

    async fn after_transition(&self, debate_id: &str, transition: &Transition) {
        if transition.reason == ReasonCode::T011_ASK_WINDOW_ELAPSED {
            self.publish(debate_id, DebateEvent::InterruptionEnded).await;
        }
        if transition.to == Phase::Judging {
            self.spawn_judging(debate_id.to_string());
        }
    }

    /// Command lock for one debate. Sessions saved to the store by someone
    /// else get a lock on first use.
    async fn lock_debate(&self, debate_id: &str) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            match locks.get(debate_id) {
                Some(lock) => lock.clone(),
                None => {
                    self.store.get(debate_id).await?;
                    locks
                        .entry(debate_id.to_string())
                        .or_insert_with(|| Arc::new(Mutex::new(())))
                        .clone()
                }
            }
        };
        Ok(lock.lock_owned().await)
    }

    /// Load, mutate, save and broadcast under the debate's command lock
    async fn apply<T, F>(&self, debate_id: &str, op: F) -> Result<(T, SessionState)>
    where
        F: FnOnce(&mut SessionState) -> Result<T>,
    {
        let _guard = self.lock_debate(debate_id).await?;
        let mut session = self.store.get(debate_id).await?;
        let out = op(&mut session)?;
        self.store.save(&session).await?;
        self.publish(debate_id, DebateEvent::State(StateSnapshot::of(&session))).await;
        Ok((out, session))
    }

    /// Session for a late result. A debate closed or completed meanwhile
    /// takes no more turns; its verdict covers what was recorded.
    async fn live_session(&self, debate_id: &str, what: &'static str) -> Result<SessionState> {
        let session = self.store.get(debate_id).await.map_err(|e| {
            tracing::info!(debate_id, what, "debate closed during transcription, result discarded");
            e
        })?;
        if session.is_complete() {
            tracing::info!(debate_id, what, "debate completed during transcription, result discarded");
            return Err(EngineError::InvalidPhase {
                operation: what,
                phase: session.phase,
            });
        }
        Ok(session)
    }

    async fn publish(&self, debate_id: &str, event: DebateEvent) {
        if let Some(sender) = self.channels.read().await.get(debate_id) {
            // no subscribers is fine
            let _ = sender.send(event);
        }
    }

    fn spawn_judging(&self, debate_id: String) {
        let service = self.clone();
        tokio::spawn(async move {
            if let Err(e) = service.run_judging(&debate_id).await {
                tracing::warn!(debate_id = %debate_id, error = %e, "judging did not complete");
            }
        });
    }

    /// Judge outside the lock, then record the verdict and finish. If another
    /// run got there first, its verdict stands.
    async fn run_judging(&self, debate_id: &str) -> Result<Verdict> {
        let session = self.store.get(debate_id).await?;
        let verdict = self.judges.judge_session(&session).await;

        let _guard = self.lock_debate(debate_id).await?;
        let mut session = self.store.get(debate_id).await?;
        if session.phase != Phase::Judging {
            return self.store.get_judgment(debate_id).await?.ok_or(EngineError::InvalidPhase {
                operation: "judge",
                phase: session.phase,
            });
        }
        self.store.save_judgment(debate_id, &verdict).await?;
        engine::finish(&mut session)?;
        self.store.save(&session).await?;

        tracing::info!(
            debate_id,
            winner = %verdict.winner(),
            heuristic = verdict.is_heuristic(),
            "debate complete"
        );
        self.publish(debate_id, DebateEvent::State(StateSnapshot::of(&session))).await;
        self.publish(debate_id, DebateEvent::DebateComplete { winner: verdict.winner() }).await;
        Ok(verdict)
    }
}
