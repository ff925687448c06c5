//! Reason codes for phase transitions

use serde::{Deserialize, Serialize};

use crate::types::Phase;

/// Why the phase changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_camel_case_types)]
pub enum ReasonCode {
    // =========================================================================
    // T00x: Clock-driven
    // =========================================================================
    /// LOBBY → TEAM_DISCUSS
    T001_DEBATE_STARTED,
    /// TEAM_DISCUSS → SPEECH_A
    T002_DISCUSSION_ELAPSED,
    /// SPEECH_A → SPEECH_B, or SPEECH_B → SPEECH_A with speakers left
    T003_SPEECH_ELAPSED,
    /// SPEECH_B → CONCLUSION_A once both rosters are exhausted
    T004_ROSTER_EXHAUSTED,
    /// CONCLUSION_A → CONCLUSION_B
    T005_CONCLUSION_ELAPSED,
    /// CONCLUSION_B → JUDGING
    T006_CLOSING_COMPLETE,

    // =========================================================================
    // T01x: Interruptions
    // =========================================================================
    /// SPEECH_* → INTERRUPTION_ASK
    T010_INTERRUPTION_STARTED,
    /// Ask window timed out; speech resumes
    T011_ASK_WINDOW_ELAPSED,
    /// Ask window closed early; speech resumes
    T012_ASK_ENDED_EARLY,
    /// Speaker declined to yield; speech resumes
    T013_INTERRUPTION_REJECTED,

    // =========================================================================
    // T02x: Judging
    // =========================================================================
    /// JUDGING → COMPLETE
    T020_VERDICT_RECORDED,
}

impl ReasonCode {
    /// Get the code string (for logging)
    pub fn code(&self) -> &'static str {
        match self {
            Self::T001_DEBATE_STARTED => "T001_DEBATE_STARTED",
            Self::T002_DISCUSSION_ELAPSED => "T002_DISCUSSION_ELAPSED",
            Self::T003_SPEECH_ELAPSED => "T003_SPEECH_ELAPSED",
            Self::T004_ROSTER_EXHAUSTED => "T004_ROSTER_EXHAUSTED",
            Self::T005_CONCLUSION_ELAPSED => "T005_CONCLUSION_ELAPSED",
            Self::T006_CLOSING_COMPLETE => "T006_CLOSING_COMPLETE",
            Self::T010_INTERRUPTION_STARTED => "T010_INTERRUPTION_STARTED",
            Self::T011_ASK_WINDOW_ELAPSED => "T011_ASK_WINDOW_ELAPSED",
            Self::T012_ASK_ENDED_EARLY => "T012_ASK_ENDED_EARLY",
            Self::T013_INTERRUPTION_REJECTED => "T013_INTERRUPTION_REJECTED",
            Self::T020_VERDICT_RECORDED => "T020_VERDICT_RECORDED",
        }
    }

    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::T001_DEBATE_STARTED => "Debate started",
            Self::T002_DISCUSSION_ELAPSED => "Discussion time over",
            Self::T003_SPEECH_ELAPSED => "Speech time over",
            Self::T004_ROSTER_EXHAUSTED => "All speakers have spoken",
            Self::T005_CONCLUSION_ELAPSED => "Conclusion time over",
            Self::T006_CLOSING_COMPLETE => "Closing speeches complete",
            Self::T010_INTERRUPTION_STARTED => "Interruption ask window opened",
            Self::T011_ASK_WINDOW_ELAPSED => "Ask window timed out",
            Self::T012_ASK_ENDED_EARLY => "Ask window closed early",
            Self::T013_INTERRUPTION_REJECTED => "Speaker declined the interruption",
            Self::T020_VERDICT_RECORDED => "Verdict recorded",
        }
    }
}

impl std::fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.description())
    }
}

/// One phase change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub reason: ReasonCode,
}

impl Transition {
    pub fn new(from: Phase, to: Phase, reason: ReasonCode) -> Self {
        Self { from, to, reason }
    }
}
