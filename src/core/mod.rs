//! Core modules for Debattle

pub mod engine;
pub mod arbiter;
pub mod transcription;
pub mod ingest;
pub mod scoring;
pub mod transcript;
pub mod judge;
pub mod store;
pub mod service;
pub mod scheduler;
pub mod api;

pub use engine::{advance, finish, start, tick};
pub use arbiter::{can_interrupt, end_interruption_ask, reject_interruption, start_interruption_ask};
pub use transcription::{CommandTranscriber, RoutingTranscriber, TextTranscriber, Transcriber, Transcription};
pub use ingest::{submit_interruption_ask, submit_speech, InterruptionAskSubmission, SpeechSubmission};
pub use scoring::{margin_label, HeuristicJudge};
pub use transcript::{format_transcript, is_low_content, parse_transcript};
pub use judge::{Judge, JudgeRequest, JudgeService, ProcessJudge};
pub use store::{MemoryStore, SessionStore, SharedStore};
pub use service::{CreateDebate, DebateService, SharedService};
pub use scheduler::PhaseScheduler;
pub use api::{create_router, run_server};
