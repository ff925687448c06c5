//! Judging: external judge process with heuristic fallback
//!
//! A debate always gets a verdict. Without a configured judge, with a thin
//! transcript, or when the judge fails, the heuristic judge decides.

use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::core::scoring::HeuristicJudge;
use crate::core::transcript::{format_transcript, is_low_content, parse_transcript, side_texts};
use crate::error::{EngineError, Result};
use crate::types::{ExternalVerdict, SessionState, Verdict};

/// What an external judge is given
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeRequest {
    pub topic: String,
    pub transcript: String,
}

/// External judging collaborator
#[async_trait]
pub trait Judge: Send + Sync {
    async fn judge(&self, request: &JudgeRequest) -> Result<ExternalVerdict>;
}

/// Runs a judging command: `Motion: <topic>` plus the transcript on stdin,
/// one JSON verdict on stdout
#[derive(Debug, Clone)]
pub struct ProcessJudge {
    program: String,
    args: Vec<String>,
}

impl ProcessJudge {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    fn failure(&self, what: impl std::fmt::Display) -> EngineError {
        EngineError::JudgingProcessFailure(format!("{}: {}", self.program, what))
    }
}

#[async_trait]
impl Judge for ProcessJudge {
    async fn judge(&self, request: &JudgeRequest) -> Result<ExternalVerdict> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.failure(format!("spawn: {}", e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let input = format!("Motion: {}\n\n{}\n", request.topic, request.transcript);
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|e| self.failure(format!("write stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| self.failure(format!("wait: {}", e)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.failure(format!("exited with {}: {}", output.status, stderr.trim())));
        }
        parse_verdict(&output.stdout)
    }
}

/// Decode and sanity-check a judge's stdout
pub fn parse_verdict(stdout: &[u8]) -> Result<ExternalVerdict> {
    let verdict: ExternalVerdict = serde_json::from_slice(stdout)
        .map_err(|e| EngineError::JudgingProcessFailure(format!("malformed verdict: {}", e)))?;
    let in_range = |score: f64| (0.0..=100.0).contains(&score);
    if !in_range(verdict.affirmative) || !in_range(verdict.negative) {
        return Err(EngineError::JudgingProcessFailure(format!(
            "scores out of range: {} / {}",
            verdict.affirmative, verdict.negative
        )));
    }
    Ok(verdict)
}

/// Picks the external judge when it can be trusted, the heuristic otherwise
#[derive(Clone, Default)]
pub struct JudgeService {
    external: Option<Arc<dyn Judge>>,
    heuristic: Arc<HeuristicJudge>,
}

impl JudgeService {
    pub fn new(external: Option<Arc<dyn Judge>>) -> Self {
        Self {
            external,
            heuristic: Arc::new(HeuristicJudge::new()),
        }
    }

    /// Heuristic judging only
    pub fn heuristic_only() -> Self {
        Self::new(None)
    }

    /// Verdict for a recorded session
    pub async fn judge_session(&self, session: &SessionState) -> Verdict {
        let request = JudgeRequest {
            topic: session.config.topic.clone(),
            transcript: format_transcript(session),
        };
        match self.try_external(session.id(), &request).await {
            Some(verdict) => Verdict::External(verdict),
            None => Verdict::Heuristic(self.heuristic.score_session(session)),
        }
    }

    /// Verdict for a stored transcript; interruptions are not part of it
    pub async fn judge_transcript(&self, topic: &str, transcript: &str) -> Verdict {
        let request = JudgeRequest {
            topic: topic.to_string(),
            transcript: transcript.to_string(),
        };
        match self.try_external("transcript", &request).await {
            Some(verdict) => Verdict::External(verdict),
            None => {
                let texts = side_texts(&parse_transcript(transcript));
                Verdict::Heuristic(self.heuristic.score(topic, &texts, &[]))
            }
        }
    }

    async fn try_external(&self, debate_id: &str, request: &JudgeRequest) -> Option<ExternalVerdict> {
        let Some(judge) = &self.external else {
            tracing::info!(debate_id, "no external judge configured, using heuristic");
            return None;
        };
        if is_low_content(&request.transcript) {
            tracing::info!(debate_id, "transcript too thin for external judge, using heuristic");
            return None;
        }
        match judge.judge(request).await {
            Ok(verdict) => {
                tracing::info!(debate_id, winner = %verdict.winner, "external verdict received");
                Some(verdict)
            }
            Err(e) => {
                tracing::warn!(debate_id, error = %e, "external judge failed, using heuristic");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Winner;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedJudge {
        calls: AtomicUsize,
        fail: bool,
    }

    impl FixedJudge {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self { calls: AtomicUsize::new(0), fail })
        }
    }

    #[async_trait]
    impl Judge for FixedJudge {
        async fn judge(&self, _request: &JudgeRequest) -> Result<ExternalVerdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(EngineError::JudgingProcessFailure("boom".into()));
            }
            Ok(ExternalVerdict {
                winner: Winner::Negative,
                affirmative: 61.0,
                negative: 74.5,
                summary: "NEG engaged the rule.".into(),
            })
        }
    }

    fn rich_transcript() -> String {
        let body = "The issue is whether X should be banned, and according to the Act it should be.";
        format!("[00:10 AFF-1] {b}\n[03:10 NEG-1] {b}\n[06:10 AFF-Reply] {b}", b = body)
    }

    #[test]
    fn test_parse_verdict() {
        let v = parse_verdict(br#"{"winner":"AFFIRMATIVE","affirmative":70,"negative":65.5}"#).unwrap();
        assert_eq!(v.winner, Winner::Affirmative);
        assert_eq!(v.summary, "");

        assert!(parse_verdict(b"{}").is_err());
        let err = parse_verdict(br#"{"winner":"TIE","affirmative":170,"negative":65}"#).unwrap_err();
        assert!(matches!(err, EngineError::JudgingProcessFailure(_)));
    }

    #[tokio::test]
    async fn test_external_used_for_rich_transcript() {
        let judge = FixedJudge::new(false);
        let service = JudgeService::new(Some(judge.clone()));
        let verdict = service.judge_transcript("X should be banned", &rich_transcript()).await;
        assert!(!verdict.is_heuristic());
        assert_eq!(verdict.winner(), Winner::Negative);
        assert_eq!(judge.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_low_content_skips_external() {
        let judge = FixedJudge::new(false);
        let service = JudgeService::new(Some(judge.clone()));
        let verdict = service.judge_transcript("X", "[00:10 AFF-1] Hi.").await;
        assert!(verdict.is_heuristic());
        assert_eq!(judge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failure_falls_back() {
        let service = JudgeService::new(Some(FixedJudge::new(true)));
        let verdict = service.judge_transcript("X should be banned", &rich_transcript()).await;
        assert!(verdict.is_heuristic());
    }

    #[tokio::test]
    async fn test_missing_program_is_judging_failure() {
        let judge = ProcessJudge::from_command_line("debattle-no-such-judge-binary").unwrap();
        let request = JudgeRequest { topic: "X".into(), transcript: rich_transcript() };
        let err = judge.judge(&request).await.unwrap_err();
        assert!(matches!(err, EngineError::JudgingProcessFailure(_)));
    }
}
