//! Interruption arbiter: eligibility and token accounting
//!
//! Opening an ask window pauses the speaker's clock in
//! `InterruptionState::paused`; every way out of the window puts it back.

use chrono::Utc;

use crate::core::engine::resume_speech;
use crate::error::{EngineError, Result};
use crate::types::{
    InterruptionRecord, InterruptionState, PausedClock, Phase, ReasonCode, SessionState, Team,
    Transition,
};

/// Whether `team` may interrupt right now
pub fn can_interrupt(session: &SessionState, team: Team) -> bool {
    let opponent_speaking = session.phase == Phase::speech_for(team.opponent());
    opponent_speaking
        && session.remaining > session.config.interruption_early_window_secs
        && *session.interruptions_left.get(team) > 0
        && session.interruption_state.is_none()
}

/// Spend a token and open the ask window, pausing the speech clock
pub fn start_interruption_ask(session: &mut SessionState, team: Team) -> Result<Transition> {
    if !can_interrupt(session, team) {
        return Err(EngineError::InterruptionDenied(team));
    }
    let from = session.phase;
    *session.interruptions_left.get_mut(team) -= 1;
    session.interruption_state = Some(InterruptionState {
        by: team,
        started_at: Utc::now(),
        paused: PausedClock {
            phase: from,
            remaining: session.remaining,
        },
    });
    session.phase = Phase::InterruptionAsk;
    session.remaining = Phase::InterruptionAsk.duration(&session.config);

    tracing::info!(
        debate_id = session.id(),
        team = %team,
        tokens_left = *session.interruptions_left.get(team),
        paused_remaining = session.interruption_state.as_ref().map(|s| s.paused.remaining),
        "interruption ask window opened"
    );
    Ok(Transition::new(from, Phase::InterruptionAsk, ReasonCode::T010_INTERRUPTION_STARTED))
}

/// Interrupter finished early: resume the speech where it was paused
pub fn end_interruption_ask(session: &mut SessionState) -> Result<Transition> {
    ensure_pending(session, "end")?;
    resume_speech(session);

    tracing::info!(
        debate_id = session.id(),
        resumed = %session.phase,
        remaining = session.remaining,
        "interruption ask window closed early"
    );
    Ok(Transition::new(Phase::InterruptionAsk, session.phase, ReasonCode::T012_ASK_ENDED_EARLY))
}

/// Speaker declined to yield. Records the rejection against the requester
/// and resumes the speech with its clock untouched; the token stays spent.
pub fn reject_interruption(session: &mut SessionState) -> Result<Transition> {
    let by = ensure_pending(session, "reject")?;
    session.push_interruption(InterruptionRecord::rejected(by));
    resume_speech(session);

    tracing::info!(
        debate_id = session.id(),
        team = %by,
        remaining = session.remaining,
        "interruption rejected"
    );
    Ok(Transition::new(Phase::InterruptionAsk, session.phase, ReasonCode::T013_INTERRUPTION_REJECTED))
}

/// Requesting team of the open ask window
fn ensure_pending(session: &SessionState, operation: &str) -> Result<Team> {
    match (&session.interruption_state, session.phase) {
        (Some(state), Phase::InterruptionAsk) => Ok(state.by),
        _ => {
            tracing::debug!(debate_id = session.id(), operation, phase = %session.phase, "no interruption pending");
            Err(EngineError::NoInterruptionPending)
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{advance, start, tick};
    use crate::types::DebateConfig;

    /// Session in SPEECH_A with a full speech clock (30s, early window 10s)
    fn speaking_a() -> SessionState {
        let config = DebateConfig::new("d-1", "topic", 1)
            .with_timings(5, 30, 20, 4)
            .with_interruptions(2, 10);
        let mut s = SessionState::new(config, Vec::new()).unwrap();
        start(&mut s).unwrap();
        advance(&mut s).unwrap();
        assert_eq!(s.phase, Phase::SpeechA);
        s
    }

    #[test]
    fn test_only_opponent_may_interrupt() {
        let s = speaking_a();
        assert!(can_interrupt(&s, Team::B));
        assert!(!can_interrupt(&s, Team::A));
    }

    #[test]
    fn test_no_interrupt_outside_speech() {
        let config = DebateConfig::new("d-1", "topic", 1);
        let mut s = SessionState::new(config, Vec::new()).unwrap();
        assert!(!can_interrupt(&s, Team::B));
        start(&mut s).unwrap();
        assert!(!can_interrupt(&s, Team::A));
        assert!(!can_interrupt(&s, Team::B));
    }

    #[test]
    fn test_early_window_blocks() {
        let mut s = speaking_a();
        s.remaining = 11;
        assert!(can_interrupt(&s, Team::B));
        s.remaining = 10;
        assert!(!can_interrupt(&s, Team::B));
    }

    #[test]
    fn test_no_tokens_blocks() {
        let mut s = speaking_a();
        s.interruptions_left.b = 0;
        assert!(!can_interrupt(&s, Team::B));
        let err = start_interruption_ask(&mut s, Team::B).unwrap_err();
        assert_eq!(err, EngineError::InterruptionDenied(Team::B));
        assert_eq!(s.phase, Phase::SpeechA);
    }

    #[test]
    fn test_start_pauses_speech_clock() {
        let mut s = speaking_a();
        tick(&mut s);
        tick(&mut s);
        assert_eq!(s.remaining, 28);

        start_interruption_ask(&mut s, Team::B).unwrap();
        assert_eq!(s.phase, Phase::InterruptionAsk);
        assert_eq!(s.remaining, 4);
        assert_eq!(s.interruptions_left.b, 1);
        assert_eq!(s.floor, Team::A);
        let state = s.interruption_state.as_ref().unwrap();
        assert_eq!(state.by, Team::B);
        assert_eq!(state.paused, PausedClock { phase: Phase::SpeechA, remaining: 28 });
    }

    #[test]
    fn test_pending_blocks_second_request() {
        let mut s = speaking_a();
        start_interruption_ask(&mut s, Team::B).unwrap();
        assert!(!can_interrupt(&s, Team::B));
    }

    #[test]
    fn test_end_restores_exact_clock() {
        let mut s = speaking_a();
        tick(&mut s);
        start_interruption_ask(&mut s, Team::B).unwrap();
        tick(&mut s);
        let t = end_interruption_ask(&mut s).unwrap();
        assert_eq!(t.to, Phase::SpeechA);
        assert_eq!(s.phase, Phase::SpeechA);
        assert_eq!(s.remaining, 29);
        assert_eq!(s.floor, Team::A);
        assert!(s.interruption_state.is_none());
    }

    #[test]
    fn test_natural_expiry_restores_clock() {
        let mut s = speaking_a();
        start_interruption_ask(&mut s, Team::B).unwrap();
        for _ in 0..4 {
            tick(&mut s);
        }
        assert_eq!(s.phase, Phase::SpeechA);
        assert_eq!(s.remaining, 30);
        assert!(s.interruption_state.is_none());
    }

    #[test]
    fn test_reject_records_and_resumes() {
        let mut s = speaking_a();
        start_interruption_ask(&mut s, Team::B).unwrap();
        let t = reject_interruption(&mut s).unwrap();
        assert_eq!(t.reason, ReasonCode::T013_INTERRUPTION_REJECTED);
        assert_eq!(s.phase, Phase::SpeechA);
        assert_eq!(s.remaining, 30);
        assert_eq!(s.interruptions_left.b, 1);
        assert!(s.interruption_state.is_none());

        let record = &s.interruptions()[0];
        assert_eq!(record.by, Team::B);
        assert!(!record.accepted);
        assert!(record.source.is_empty());
    }

    #[test]
    fn test_end_and_reject_need_pending() {
        let mut s = speaking_a();
        assert_eq!(end_interruption_ask(&mut s).unwrap_err(), EngineError::NoInterruptionPending);
        assert_eq!(reject_interruption(&mut s).unwrap_err(), EngineError::NoInterruptionPending);
        assert!(s.interruptions().is_empty());
    }

    #[test]
    fn test_tokens_run_out() {
        let mut s = speaking_a();
        for _ in 0..2 {
            start_interruption_ask(&mut s, Team::B).unwrap();
            end_interruption_ask(&mut s).unwrap();
        }
        assert_eq!(s.interruptions_left.b, 0);
        assert!(!can_interrupt(&s, Team::B));
    }
}
