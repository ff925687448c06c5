//! Speech ingestion: floor checks, transcription, append
//!
//! The check and the append are split so a caller can release the session
//! while the transcriber runs. A late result is still appended even if the
//! phase has moved on.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::core::transcription::{Transcriber, Transcription};
use crate::error::{EngineError, Result};
use crate::types::{AudioTurn, InterruptionRecord, Phase, SessionState, Team};

/// A recorded speech or conclusion awaiting transcription
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechSubmission {
    pub team: Team,
    pub phase: Phase,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speaker_id: Option<String>,
}

/// A recorded question during an ask window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterruptionAskSubmission {
    pub team: Team,
    pub source: String,
}

/// Only the team holding the floor for exactly this phase may submit
pub fn check_speech(session: &SessionState, submission: &SpeechSubmission) -> Result<()> {
    let legal = session.phase == submission.phase
        && submission.phase.team() == Some(submission.team)
        && session.floor == submission.team;
    if legal {
        Ok(())
    } else {
        Err(EngineError::InvalidFloor {
            team: submission.team,
            requested: submission.phase,
            current: session.phase,
        })
    }
}

/// Only the requesting team may speak into its open ask window
pub fn check_interruption_ask(session: &SessionState, team: Team) -> Result<()> {
    match &session.interruption_state {
        Some(state) if session.phase == Phase::InterruptionAsk && state.by == team => Ok(()),
        _ => Err(EngineError::NoInterruptionWindow(team)),
    }
}

/// Append a transcribed speech
pub fn record_speech(
    session: &mut SessionState,
    submission: SpeechSubmission,
    transcription: Transcription,
) -> AudioTurn {
    let turn = AudioTurn {
        phase: submission.phase,
        team: submission.team,
        speaker_id: submission.speaker_id,
        speaker_idx: *session.active_speaker_idx.get(submission.team),
        source: submission.source,
        text: transcription.text,
        duration_ms: transcription.duration_ms,
        captured_at: Utc::now(),
    };
    session.push_audio_turn(turn.clone());
    turn
}

/// Append an accepted interruption with its question
pub fn record_interruption_ask(
    session: &mut SessionState,
    submission: InterruptionAskSubmission,
    transcription: Transcription,
) -> InterruptionRecord {
    let record = InterruptionRecord::accepted(submission.team, submission.source, transcription.text);
    session.push_interruption(record.clone());
    record
}

/// Check, transcribe and append a speech in one go
pub async fn submit_speech(
    session: &mut SessionState,
    submission: SpeechSubmission,
    transcriber: &dyn Transcriber,
) -> Result<AudioTurn> {
    check_speech(session, &submission)?;
    let transcription = transcriber.transcribe(&submission.source).await?;
    let turn = record_speech(session, submission, transcription);
    tracing::info!(
        debate_id = session.id(),
        team = %turn.team,
        phase = %turn.phase,
        duration_ms = turn.duration_ms,
        "speech recorded"
    );
    Ok(turn)
}

/// Check, transcribe and append an interruption question.
/// The ask window stays open; closing it is a separate operation.
pub async fn submit_interruption_ask(
    session: &mut SessionState,
    submission: InterruptionAskSubmission,
    transcriber: &dyn Transcriber,
) -> Result<InterruptionRecord> {
    check_interruption_ask(session, submission.team)?;
    let transcription = transcriber.transcribe(&submission.source).await?;
    let record = record_interruption_ask(session, submission, transcription);
    tracing::info!(debate_id = session.id(), team = %record.by, "interruption question recorded");
    Ok(record)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::arbiter::start_interruption_ask;
    use crate::core::engine::{advance, start};
    use crate::core::transcription::TextTranscriber;
    use crate::types::DebateConfig;
    use async_trait::async_trait;

    struct FailingTranscriber;

    #[async_trait]
    impl Transcriber for FailingTranscriber {
        async fn transcribe(&self, _source: &str) -> Result<Transcription> {
            Err(EngineError::TranscriptionFailure("backend down".into()))
        }
    }

    fn speaking_a() -> SessionState {
        let config = DebateConfig::new("d-1", "X should be banned", 1)
            .with_timings(5, 60, 30, 10)
            .with_interruptions(2, 10);
        let mut s = SessionState::new(config, Vec::new()).unwrap();
        start(&mut s).unwrap();
        advance(&mut s).unwrap();
        s
    }

    fn speech(team: Team, phase: Phase, text: &str) -> SpeechSubmission {
        SpeechSubmission {
            team,
            phase,
            source: format!("text:{}", text),
            speaker_id: Some("ana".into()),
        }
    }

    #[tokio::test]
    async fn test_floor_holder_submits() {
        let mut s = speaking_a();
        let turn = submit_speech(&mut s, speech(Team::A, Phase::SpeechA, "We propose a ban."), &TextTranscriber)
            .await
            .unwrap();
        assert_eq!(turn.text, "We propose a ban.");
        assert_eq!(turn.speaker_idx, 0);
        assert_eq!(s.audio_turns().len(), 1);
        assert_eq!(s.audio_turns()[0].speaker_id.as_deref(), Some("ana"));
    }

    #[tokio::test]
    async fn test_wrong_team_rejected_without_change() {
        let mut s = speaking_a();
        let err = submit_speech(&mut s, speech(Team::B, Phase::SpeechA, "No."), &TextTranscriber)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidFloor { team: Team::B, .. }));

        let err = submit_speech(&mut s, speech(Team::B, Phase::SpeechB, "No."), &TextTranscriber)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidFloor { current: Phase::SpeechA, .. }));
        assert!(s.audio_turns().is_empty());
    }

    #[tokio::test]
    async fn test_transcription_failure_appends_nothing() {
        let mut s = speaking_a();
        let err = submit_speech(&mut s, speech(Team::A, Phase::SpeechA, "x"), &FailingTranscriber)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::TranscriptionFailure(_)));
        assert!(s.audio_turns().is_empty());
    }

    #[tokio::test]
    async fn test_ask_needs_open_window_for_that_team() {
        let mut s = speaking_a();
        let ask = InterruptionAskSubmission { team: Team::B, source: "text:Why?".into() };
        let err = submit_interruption_ask(&mut s, ask.clone(), &TextTranscriber).await.unwrap_err();
        assert_eq!(err, EngineError::NoInterruptionWindow(Team::B));

        start_interruption_ask(&mut s, Team::B).unwrap();
        let wrong = InterruptionAskSubmission { team: Team::A, source: "text:Why?".into() };
        assert!(submit_interruption_ask(&mut s, wrong, &TextTranscriber).await.is_err());

        let record = submit_interruption_ask(&mut s, ask, &TextTranscriber).await.unwrap();
        assert!(record.accepted);
        assert_eq!(record.text.as_deref(), Some("Why?"));
        assert_eq!(s.phase, Phase::InterruptionAsk);
        assert_eq!(s.interruptions().len(), 1);
    }
}
