//! Engine error taxonomy
//!
//! Every failing operation leaves the session untouched; nothing here is fatal
//! to the scheduler loop.

use thiserror::Error;

use crate::types::{Phase, Team};

/// Errors produced by engine operations and their collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Submission does not match the current phase/team/floor.
    #[error("team {team} cannot submit for {requested} while phase is {current}")]
    InvalidFloor {
        team: Team,
        requested: Phase,
        current: Phase,
    },

    /// Interruption ask outside an open window, or by the wrong team.
    #[error("no interruption window open for team {0}")]
    NoInterruptionWindow(Team),

    /// No ask window is open to end or reject.
    #[error("no interruption pending")]
    NoInterruptionPending,

    /// Request failed the interruption eligibility check.
    #[error("team {0} may not interrupt now")]
    InterruptionDenied(Team),

    /// Operation is not legal in the current phase.
    #[error("{operation} is not legal in phase {phase}")]
    InvalidPhase {
        operation: &'static str,
        phase: Phase,
    },

    /// Transcriber errored or returned malformed output.
    #[error("transcription failed: {0}")]
    TranscriptionFailure(String),

    /// External judge errored; callers fall back to heuristic scoring.
    #[error("judging process failed: {0}")]
    JudgingProcessFailure(String),

    /// Debate configuration rejected.
    #[error("invalid debate config: {0}")]
    InvalidConfig(String),

    /// No session with this id.
    #[error("debate not found: {0}")]
    SessionNotFound(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offender() {
        let err = EngineError::InvalidFloor {
            team: Team::B,
            requested: Phase::SpeechA,
            current: Phase::SpeechA,
        };
        assert_eq!(
            err.to_string(),
            "team B cannot submit for SPEECH_A while phase is SPEECH_A"
        );

        let err = EngineError::InvalidPhase {
            operation: "start",
            phase: Phase::Judging,
        };
        assert_eq!(err.to_string(), "start is not legal in phase JUDGING");
    }
}
