//! Debate phases, teams and per-team counters

use serde::{Deserialize, Serialize};

use crate::types::DebateConfig;

/// The two sides of a debate. Team A opens; it is the affirmative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    A,
    B,
}

impl Team {
    /// The other team
    pub fn opponent(self) -> Team {
        match self {
            Team::A => Team::B,
            Team::B => Team::A,
        }
    }

    /// Transcript side label
    pub fn side_label(self) -> &'static str {
        match self {
            Team::A => "AFF",
            Team::B => "NEG",
        }
    }

    /// Team for a transcript side label
    pub fn from_side_label(label: &str) -> Option<Team> {
        match label {
            "AFF" => Some(Team::A),
            "NEG" => Some(Team::B),
            _ => None,
        }
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Team::A => "A",
            Team::B => "B",
        };
        write!(f, "{}", name)
    }
}

/// A value held once per team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerTeam<T> {
    #[serde(rename = "A")]
    pub a: T,
    #[serde(rename = "B")]
    pub b: T,
}

impl<T> PerTeam<T> {
    pub fn new(a: T, b: T) -> Self {
        Self { a, b }
    }

    pub fn get(&self, team: Team) -> &T {
        match team {
            Team::A => &self.a,
            Team::B => &self.b,
        }
    }

    pub fn get_mut(&mut self, team: Team) -> &mut T {
        match team {
            Team::A => &mut self.a,
            Team::B => &mut self.b,
        }
    }
}

impl<T: Clone> PerTeam<T> {
    /// Same value for both teams
    pub fn splat(value: T) -> Self {
        Self {
            a: value.clone(),
            b: value,
        }
    }
}

/// Every state the debate can be in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Created, not started
    Lobby,
    /// Both teams prepare
    TeamDiscuss,
    /// Team A speaker holds the floor
    SpeechA,
    /// Team B speaker holds the floor
    SpeechB,
    /// Opponent poses a question; the speech clock is paused
    InterruptionAsk,
    /// Team A closing
    ConclusionA,
    /// Team B closing
    ConclusionB,
    /// Transcript complete, waiting for a verdict
    Judging,
    /// Verdict available; read-only from here
    Complete,
}

impl Phase {
    /// Configured duration of this phase in seconds
    pub fn duration(self, config: &DebateConfig) -> u32 {
        match self {
            Phase::TeamDiscuss => config.discussion_secs,
            Phase::SpeechA | Phase::SpeechB => config.speech_secs,
            Phase::ConclusionA | Phase::ConclusionB => config.conclusion_secs,
            Phase::InterruptionAsk => config.interruption_ask_secs,
            Phase::Lobby | Phase::Judging | Phase::Complete => 0,
        }
    }

    /// Team implied by an `_A`/`_B` suffix
    pub fn team(self) -> Option<Team> {
        match self {
            Phase::SpeechA | Phase::ConclusionA => Some(Team::A),
            Phase::SpeechB | Phase::ConclusionB => Some(Team::B),
            Phase::Lobby
            | Phase::TeamDiscuss
            | Phase::InterruptionAsk
            | Phase::Judging
            | Phase::Complete => None,
        }
    }

    /// Speech phase in which `team` holds the floor
    pub fn speech_for(team: Team) -> Phase {
        match team {
            Team::A => Phase::SpeechA,
            Team::B => Phase::SpeechB,
        }
    }

    pub fn is_speech(self) -> bool {
        matches!(self, Phase::SpeechA | Phase::SpeechB)
    }

    pub fn is_conclusion(self) -> bool {
        matches!(self, Phase::ConclusionA | Phase::ConclusionB)
    }

    /// Whether the clock runs in this phase
    pub fn is_ticking(self) -> bool {
        !matches!(self, Phase::Lobby | Phase::Judging | Phase::Complete)
    }

    /// Get ANSI color code for terminal display
    pub fn color_code(self) -> &'static str {
        match self {
            Phase::Lobby | Phase::TeamDiscuss => "\x1b[90m", // Gray
            Phase::SpeechA | Phase::ConclusionA => "\x1b[34m", // Blue
            Phase::SpeechB | Phase::ConclusionB => "\x1b[35m", // Magenta
            Phase::InterruptionAsk => "\x1b[33m",              // Yellow
            Phase::Judging | Phase::Complete => "\x1b[32m",    // Green
        }
    }

    /// Reset ANSI color
    pub fn color_reset() -> &'static str {
        "\x1b[0m"
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Lobby => "LOBBY",
            Phase::TeamDiscuss => "TEAM_DISCUSS",
            Phase::SpeechA => "SPEECH_A",
            Phase::SpeechB => "SPEECH_B",
            Phase::InterruptionAsk => "INTERRUPTION_ASK",
            Phase::ConclusionA => "CONCLUSION_A",
            Phase::ConclusionB => "CONCLUSION_B",
            Phase::Judging => "JUDGING",
            Phase::Complete => "COMPLETE",
        };
        write!(f, "{}", name)
    }
}
