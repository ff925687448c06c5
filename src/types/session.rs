//! Session state: the record of one debate
//!
//! Owned by the engine. Transport and persistence read it; only the engine
//! operations mutate it. Both logs are append-only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{DebateConfig, Phase, PerTeam, Team};

/// A roster entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub team: Team,
    /// 0-based speaking order within the team
    pub order: u32,
}

/// The speech clock frozen while an ask window is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PausedClock {
    pub phase: Phase,
    pub remaining: u32,
}

/// Present only while phase is INTERRUPTION_ASK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionState {
    pub by: Team,
    pub started_at: DateTime<Utc>,
    pub paused: PausedClock,
}

/// One recorded speech or conclusion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTurn {
    pub phase: Phase,
    pub team: Team,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
    /// Rotation index of the team when the turn was captured
    pub speaker_idx: i32,
    pub source: String,
    pub text: String,
    pub duration_ms: u64,
    pub captured_at: DateTime<Utc>,
}

/// Outcome of one interruption request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionRecord {
    pub by: Team,
    /// Empty for rejected requests
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub accepted: bool,
    pub at: DateTime<Utc>,
}

impl InterruptionRecord {
    /// Accepted ask with its transcribed question
    pub fn accepted(by: Team, source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            by,
            source: source.into(),
            text: Some(text.into()),
            accepted: true,
            at: Utc::now(),
        }
    }

    /// Speaker declined to yield
    pub fn rejected(by: Team) -> Self {
        Self {
            by,
            source: String::new(),
            text: None,
            accepted: false,
            at: Utc::now(),
        }
    }
}

/// Full state of one debate
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub config: DebateConfig,
    pub phase: Phase,
    /// Seconds left in the current phase
    pub remaining: u32,
    /// Team currently allowed to speak
    pub floor: Team,
    /// -1 until the team's first speech, clamped to team_size - 1
    pub active_speaker_idx: PerTeam<i32>,
    pub interruptions_left: PerTeam<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interruption_state: Option<InterruptionState>,
    pub players: Vec<Player>,
    audio_turns: Vec<AudioTurn>,
    interruptions: Vec<InterruptionRecord>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
}

impl SessionState {
    /// Fresh session in LOBBY
    pub fn new(config: DebateConfig, players: Vec<Player>) -> Result<Self> {
        config.validate()?;
        let tokens = config.max_interruptions_per_team;
        Ok(Self {
            config,
            phase: Phase::Lobby,
            remaining: 0,
            floor: Team::A,
            active_speaker_idx: PerTeam::splat(-1),
            interruptions_left: PerTeam::splat(tokens),
            interruption_state: None,
            players,
            audio_turns: Vec::new(),
            interruptions: Vec::new(),
            created_at: Utc::now(),
            started_at: None,
        })
    }

    pub fn id(&self) -> &str {
        &self.config.debate_id
    }

    /// Recorded speeches and conclusions, oldest first
    pub fn audio_turns(&self) -> &[AudioTurn] {
        &self.audio_turns
    }

    /// Interruption outcomes, oldest first
    pub fn interruptions(&self) -> &[InterruptionRecord] {
        &self.interruptions
    }

    pub fn push_audio_turn(&mut self, turn: AudioTurn) {
        self.audio_turns.push(turn);
    }

    pub fn push_interruption(&mut self, record: InterruptionRecord) {
        self.interruptions.push(record);
    }

    /// Recorded turns for one team, oldest first
    pub fn turns_for(&self, team: Team) -> impl Iterator<Item = &AudioTurn> {
        self.audio_turns.iter().filter(move |t| t.team == team)
    }

    /// Current speaker of `team`, if the roster names one
    pub fn active_player(&self, team: Team) -> Option<&Player> {
        let idx = *self.active_speaker_idx.get(team);
        if idx < 0 {
            return None;
        }
        self.players
            .iter()
            .find(|p| p.team == team && p.order as i32 == idx)
    }

    pub fn is_complete(&self) -> bool {
        self.phase == Phase::Complete
    }

    /// Compact status line
    pub fn status_line(&self) -> String {
        format!(
            "[{}] {}s | floor={} | speakers A={} B={} | tokens A={} B={} | turns={}",
            self.phase,
            self.remaining,
            self.floor,
            self.active_speaker_idx.a,
            self.active_speaker_idx.b,
            self.interruptions_left.a,
            self.interruptions_left.b,
            self.audio_turns.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster() -> Vec<Player> {
        vec![
            Player { id: "ana".into(), team: Team::A, order: 0 },
            Player { id: "bo".into(), team: Team::B, order: 0 },
        ]
    }

    #[test]
    fn test_new_session_in_lobby() {
        let config = DebateConfig::new("d-1", "X should be banned", 1);
        let session = SessionState::new(config, roster()).unwrap();
        assert_eq!(session.phase, Phase::Lobby);
        assert_eq!(session.remaining, 0);
        assert_eq!(session.floor, Team::A);
        assert_eq!(session.active_speaker_idx, PerTeam::new(-1, -1));
        assert_eq!(session.interruptions_left.a, session.config.max_interruptions_per_team);
        assert!(session.interruption_state.is_none());
        assert!(session.audio_turns().is_empty());
        assert!(session.interruptions().is_empty());
    }

    #[test]
    fn test_invalid_config_refused() {
        let config = DebateConfig::new("d-1", "t", 4);
        assert!(SessionState::new(config, Vec::new()).is_err());
    }

    #[test]
    fn test_active_player_follows_index() {
        let config = DebateConfig::new("d-1", "t", 1);
        let mut session = SessionState::new(config, roster()).unwrap();
        assert!(session.active_player(Team::A).is_none());
        session.active_speaker_idx.a = 0;
        assert_eq!(session.active_player(Team::A).unwrap().id, "ana");
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let config = DebateConfig::new("d-1", "t", 1);
        let session = SessionState::new(config, roster()).unwrap();
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["phase"], "LOBBY");
        assert_eq!(json["activeSpeakerIdx"]["A"], -1);
        assert!(json["audioTurns"].as_array().unwrap().is_empty());
        assert!(json.get("interruptionState").is_none());
    }
}
