//! Debattle: timed two-team debate engine
//!
//! Phase/timer state machine, floor control with interruption arbitration,
//! speech ingestion through an external transcriber and a deterministic
//! heuristic judge that reads the recorded transcript.

pub mod core;
pub mod error;
pub mod logging;
pub mod types;

pub use error::{EngineError, Result};

// =============================================================================
// DEFAULT DEBATE TIMINGS [s]
// =============================================================================

/// Team discussion before the first speech
pub const DEFAULT_DISCUSSION_SECS: u32 = 120;

/// One substantive speech
pub const DEFAULT_SPEECH_SECS: u32 = 180;

/// One conclusion (reply) speech
pub const DEFAULT_CONCLUSION_SECS: u32 = 120;

/// Interruption ask window
pub const DEFAULT_INTERRUPTION_ASK_SECS: u32 = 15;

/// Interruptions are refused once the speaker has this many seconds or fewer left
pub const DEFAULT_INTERRUPTION_EARLY_WINDOW_SECS: u32 = 20;

/// Interruption tokens per team
pub const DEFAULT_MAX_INTERRUPTIONS_PER_TEAM: u32 = 2;

// =============================================================================
// HEURISTIC SCORING WEIGHTS
// =============================================================================

/// Every axis lives in [0, AXIS_MAX]
pub const AXIS_MAX: f64 = 5.0;

pub const CLARITY_BASE: f64 = 3.0;
/// Penalty per sentence longer than LONG_SENTENCE_WORDS
pub const CLARITY_LONG_SENTENCE_PENALTY: f64 = 0.4;
/// Bonus for producing more than CLARITY_SENTENCE_BONUS_MIN sentences
pub const CLARITY_VOLUME_BONUS: f64 = 1.0;
/// Bonus for a non-empty side with no over-long sentence
pub const CLARITY_CONCISION_BONUS: f64 = 1.0;
pub const CLARITY_SENTENCE_BONUS_MIN: usize = 4;
pub const LONG_SENTENCE_WORDS: usize = 25;

pub const RELEVANCE_BASE: f64 = 1.0;
pub const RELEVANCE_SPAN: f64 = 4.0;

pub const EVIDENCE_BASE: f64 = 1.0;
pub const EVIDENCE_PER_CITATION: f64 = 0.6;

pub const IRAC_BASE: f64 = 1.0;
pub const IRAC_PER_MARKER: f64 = 0.5;

pub const CIVILITY_PER_INCIVILITY: f64 = 1.5;

/// Accepted interruption: requester clarity bonus
pub const ACCEPTED_INTERRUPTION_CLARITY: f64 = 0.2;
/// Accepted interruption: yielding speaker IRAC bonus
pub const YIELDED_INTERRUPTION_IRAC: f64 = 0.2;
/// Rejected interruption: requester civility penalty
pub const REJECTED_INTERRUPTION_CIVILITY: f64 = 0.2;

/// Totals closer than this are a tie
pub const TIE_MARGIN: f64 = 0.25;

/// Maximum feedback bullets per side
pub const MAX_FEEDBACK_BULLETS: usize = 5;

// =============================================================================
// TRANSCRIPTION STUB
// =============================================================================

/// Handles with this prefix carry their own text and skip real transcription
pub const TEXT_HANDLE_PREFIX: &str = "text:";

/// Simulated speaking pace for text handles
pub const TEXT_HANDLE_MS_PER_WORD: u64 = 400;
pub const TEXT_HANDLE_MIN_MS: u64 = 1_000;
pub const TEXT_HANDLE_MAX_MS: u64 = 120_000;

// =============================================================================
// VERSION
// =============================================================================

pub const VERSION: &str = "1.0.0";
