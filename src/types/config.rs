//! Debate configuration, immutable once the session exists

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::{
    DEFAULT_CONCLUSION_SECS, DEFAULT_DISCUSSION_SECS, DEFAULT_INTERRUPTION_ASK_SECS,
    DEFAULT_INTERRUPTION_EARLY_WINDOW_SECS, DEFAULT_MAX_INTERRUPTIONS_PER_TEAM,
    DEFAULT_SPEECH_SECS,
};

/// Timings and budgets for one debate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebateConfig {
    pub debate_id: String,
    pub topic: String,
    /// Speakers per team: 1 or 3
    pub team_size: u32,
    pub discussion_secs: u32,
    pub speech_secs: u32,
    pub conclusion_secs: u32,
    pub interruption_ask_secs: u32,
    /// No interruptions once the speaker has this many seconds or fewer left
    pub interruption_early_window_secs: u32,
    pub max_interruptions_per_team: u32,
}

impl DebateConfig {
    /// Config with default timings
    pub fn new(debate_id: impl Into<String>, topic: impl Into<String>, team_size: u32) -> Self {
        Self {
            debate_id: debate_id.into(),
            topic: topic.into(),
            team_size,
            discussion_secs: DEFAULT_DISCUSSION_SECS,
            speech_secs: DEFAULT_SPEECH_SECS,
            conclusion_secs: DEFAULT_CONCLUSION_SECS,
            interruption_ask_secs: DEFAULT_INTERRUPTION_ASK_SECS,
            interruption_early_window_secs: DEFAULT_INTERRUPTION_EARLY_WINDOW_SECS,
            max_interruptions_per_team: DEFAULT_MAX_INTERRUPTIONS_PER_TEAM,
        }
    }

    /// Override every phase length at once
    pub fn with_timings(
        mut self,
        discussion_secs: u32,
        speech_secs: u32,
        conclusion_secs: u32,
        interruption_ask_secs: u32,
    ) -> Self {
        self.discussion_secs = discussion_secs;
        self.speech_secs = speech_secs;
        self.conclusion_secs = conclusion_secs;
        self.interruption_ask_secs = interruption_ask_secs;
        self
    }

    /// Override the interruption budget and early-window floor
    pub fn with_interruptions(mut self, max_per_team: u32, early_window_secs: u32) -> Self {
        self.max_interruptions_per_team = max_per_team;
        self.interruption_early_window_secs = early_window_secs;
        self
    }

    /// Reject configs the engine cannot run
    pub fn validate(&self) -> Result<()> {
        if self.team_size != 1 && self.team_size != 3 {
            return Err(EngineError::InvalidConfig(format!(
                "team size must be 1 or 3, got {}",
                self.team_size
            )));
        }
        let phases = [
            ("discussion", self.discussion_secs),
            ("speech", self.speech_secs),
            ("conclusion", self.conclusion_secs),
            ("interruption ask", self.interruption_ask_secs),
        ];
        if let Some((name, _)) = phases.iter().find(|(_, secs)| *secs == 0) {
            return Err(EngineError::InvalidConfig(format!(
                "{} duration must be positive",
                name
            )));
        }
        Ok(())
    }

    /// Highest valid speaker rotation index
    pub fn last_speaker_idx(&self) -> i32 {
        self.team_size as i32 - 1
    }
}
