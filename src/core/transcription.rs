//! Transcription collaborator
//!
//! `text:` handles carry their own words and never leave the process; any
//! other handle goes to the configured speech-to-text command.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::error::{EngineError, Result};
use crate::{TEXT_HANDLE_MAX_MS, TEXT_HANDLE_MIN_MS, TEXT_HANDLE_MS_PER_WORD, TEXT_HANDLE_PREFIX};

/// What the transcriber returns for one audio handle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub text: String,
    pub duration_ms: u64,
}

/// Turns an audio handle into text
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, source: &str) -> Result<Transcription>;
}

/// Deterministic substitute for `text:` handles
#[derive(Debug, Default, Clone)]
pub struct TextTranscriber;

impl TextTranscriber {
    pub fn new() -> Self {
        Self
    }

    /// Whether the handle uses the reserved prefix
    pub fn handles(source: &str) -> bool {
        source.starts_with(TEXT_HANDLE_PREFIX)
    }

    /// Simulated speaking time for a piece of text
    pub fn duration_for(text: &str) -> u64 {
        let words = text.split_whitespace().count() as u64;
        (words * TEXT_HANDLE_MS_PER_WORD).clamp(TEXT_HANDLE_MIN_MS, TEXT_HANDLE_MAX_MS)
    }
}

#[async_trait]
impl Transcriber for TextTranscriber {
    async fn transcribe(&self, source: &str) -> Result<Transcription> {
        let text = source.strip_prefix(TEXT_HANDLE_PREFIX).ok_or_else(|| {
            EngineError::TranscriptionFailure(format!("not a text handle: {}", source))
        })?;
        let text = text.trim().to_string();
        Ok(Transcription {
            duration_ms: Self::duration_for(&text),
            text,
        })
    }
}

/// Marks where the audio handle goes in a transcriber command line
pub const HANDLE_PLACEHOLDER: &str = "{}";

/// Runs `<program> [args..]` and reads a JSON transcription from stdout.
/// The handle replaces every `{}` argument, or is appended when there is none,
/// so both `stt --in {}` and `stt` work.
#[derive(Debug, Clone)]
pub struct CommandTranscriber {
    program: String,
    args: Vec<String>,
}

impl CommandTranscriber {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }

    /// Arguments for one handle
    fn args_for(&self, source: &str) -> Vec<String> {
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|a| a.replace(HANDLE_PLACEHOLDER, source))
            .collect();
        if !self.args.iter().any(|a| a.contains(HANDLE_PLACEHOLDER)) {
            args.push(source.to_string());
        }
        args
    }
}

#[async_trait]
impl Transcriber for CommandTranscriber {
    async fn transcribe(&self, source: &str) -> Result<Transcription> {
        let output = Command::new(&self.program)
            .args(self.args_for(source))
            .output()
            .await
            .map_err(|e| EngineError::TranscriptionFailure(format!("spawn {}: {}", self.program, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::TranscriptionFailure(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        parse_transcription(&output.stdout)
    }
}

/// Raw stdout shape; speech-recognition wrappers may print `ms` and a soft `error`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TranscriberOutput {
    text: String,
    #[serde(alias = "ms")]
    duration_ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Decode the transcriber's stdout
pub fn parse_transcription(stdout: &[u8]) -> Result<Transcription> {
    let output: TranscriberOutput = serde_json::from_slice(stdout)
        .map_err(|e| EngineError::TranscriptionFailure(format!("malformed output: {}", e)))?;
    match output.error {
        Some(error) => Err(EngineError::TranscriptionFailure(error)),
        None => Ok(Transcription {
            text: output.text,
            duration_ms: output.duration_ms,
        }),
    }
}

/// Text handles first, then the external backend if one is configured
#[derive(Debug, Clone, Default)]
pub struct RoutingTranscriber {
    text: TextTranscriber,
    backend: Option<CommandTranscriber>,
}

impl RoutingTranscriber {
    pub fn new(backend: Option<CommandTranscriber>) -> Self {
        Self {
            text: TextTranscriber::new(),
            backend,
        }
    }
}

#[async_trait]
impl Transcriber for RoutingTranscriber {
    async fn transcribe(&self, source: &str) -> Result<Transcription> {
        if TextTranscriber::handles(source) {
            return self.text.transcribe(source).await;
        }
        match &self.backend {
            Some(backend) => backend.transcribe(source).await,
            None => Err(EngineError::TranscriptionFailure(format!(
                "no transcriber configured for {}",
                source
            ))),
        }
    }
}
