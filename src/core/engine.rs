//! Transition engine: phase clock and speaker rotation
//!
//! Transition table (on expiry of the current phase):
//! - TEAM_DISCUSS → SPEECH_A (A rotates)
//! - SPEECH_A → SPEECH_B (B rotates)
//! - SPEECH_B → CONCLUSION_A if both rosters are exhausted, else SPEECH_A (A rotates)
//! - CONCLUSION_A → CONCLUSION_B → JUDGING
//! - INTERRUPTION_ASK → the paused speech, with its paused remaining time
//!
//! Rotation happens on entry so `floor` always names who may speak now.

use chrono::Utc;

use crate::error::{EngineError, Result};
use crate::types::{Phase, ReasonCode, SessionState, Team, Transition};

/// LOBBY → TEAM_DISCUSS. Team A will open the first speech.
pub fn start(session: &mut SessionState) -> Result<Transition> {
    if session.phase != Phase::Lobby {
        return Err(EngineError::InvalidPhase {
            operation: "start",
            phase: session.phase,
        });
    }
    enter(session, Phase::TeamDiscuss);
    session.floor = Team::A;
    session.started_at = Some(Utc::now());

    let transition = Transition::new(Phase::Lobby, Phase::TeamDiscuss, ReasonCode::T001_DEBATE_STARTED);
    log_transition(session, &transition);
    Ok(transition)
}

/// Advance the clock by exactly one second.
///
/// Returns the transition taken when the phase ran out. Does nothing before
/// `start` and from JUDGING on.
pub fn tick(session: &mut SessionState) -> Option<Transition> {
    if !session.phase.is_ticking() {
        return None;
    }
    session.remaining = session.remaining.saturating_sub(1);
    if session.remaining > 0 {
        return None;
    }
    advance(session).ok()
}

/// Leave the current phase per the transition table
pub fn advance(session: &mut SessionState) -> Result<Transition> {
    let from = session.phase;
    let reason = match from {
        Phase::TeamDiscuss => {
            rotate(session, Team::A);
            enter(session, Phase::SpeechA);
            ReasonCode::T002_DISCUSSION_ELAPSED
        }
        Phase::SpeechA => {
            rotate(session, Team::B);
            enter(session, Phase::SpeechB);
            ReasonCode::T003_SPEECH_ELAPSED
        }
        Phase::SpeechB => {
            if rosters_exhausted(session) {
                enter(session, Phase::ConclusionA);
                ReasonCode::T004_ROSTER_EXHAUSTED
            } else {
                rotate(session, Team::A);
                enter(session, Phase::SpeechA);
                ReasonCode::T003_SPEECH_ELAPSED
            }
        }
        Phase::ConclusionA => {
            enter(session, Phase::ConclusionB);
            ReasonCode::T005_CONCLUSION_ELAPSED
        }
        Phase::ConclusionB => {
            enter(session, Phase::Judging);
            ReasonCode::T006_CLOSING_COMPLETE
        }
        Phase::InterruptionAsk => {
            resume_speech(session);
            ReasonCode::T011_ASK_WINDOW_ELAPSED
        }
        Phase::Lobby | Phase::Judging | Phase::Complete => {
            return Err(EngineError::InvalidPhase {
                operation: "advance",
                phase: from,
            });
        }
    };

    let transition = Transition::new(from, session.phase, reason);
    log_transition(session, &transition);
    Ok(transition)
}

/// JUDGING → COMPLETE once a verdict exists
pub fn finish(session: &mut SessionState) -> Result<Transition> {
    if session.phase != Phase::Judging {
        return Err(EngineError::InvalidPhase {
            operation: "finish",
            phase: session.phase,
        });
    }
    enter(session, Phase::Complete);
    let transition = Transition::new(Phase::Judging, Phase::Complete, ReasonCode::T020_VERDICT_RECORDED);
    log_transition(session, &transition);
    Ok(transition)
}

/// Both teams are on their last speaker
pub fn rosters_exhausted(session: &SessionState) -> bool {
    let last = session.config.last_speaker_idx();
    session.active_speaker_idx.a == last && session.active_speaker_idx.b == last
}

/// Close the ask window and put the paused speech clock back
pub(crate) fn resume_speech(session: &mut SessionState) {
    let speech = Phase::speech_for(session.floor);
    let remaining = match session.interruption_state.take() {
        Some(state) => state.paused.remaining,
        None => speech.duration(&session.config),
    };
    session.phase = speech;
    session.remaining = remaining;
}

/// Switch phase, load its duration and hand the floor to its team
fn enter(session: &mut SessionState, phase: Phase) {
    session.phase = phase;
    session.remaining = phase.duration(&session.config);
    if let Some(team) = phase.team() {
        session.floor = team;
    }
}

/// Move a team to its next speaker, clamped to the roster
fn rotate(session: &mut SessionState, team: Team) {
    let last = session.config.last_speaker_idx();
    let idx = session.active_speaker_idx.get_mut(team);
    *idx = (*idx + 1).min(last);
}

fn log_transition(session: &SessionState, transition: &Transition) {
    tracing::debug!(
        debate_id = session.id(),
        from = %transition.from,
        to = %transition.to,
        reason = transition.reason.code(),
        remaining = session.remaining,
        "phase transition"
    );
}

// =============================================================================
// TESTS
// =============================================================================
