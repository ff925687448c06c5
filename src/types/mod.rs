//! Core types for Debattle

mod config;
mod judgment;
mod output;
mod phase;
mod reason;
mod session;

pub use config::DebateConfig;
pub use judgment::{AxisScores, ExternalVerdict, Judgment, SideJudgment, Verdict, Winner};
pub use output::{DebateEvent, RealtimeCommand, StateSnapshot};
pub use phase::{Phase, PerTeam, Team};
pub use reason::{ReasonCode, Transition};
pub use session::{
    AudioTurn, InterruptionRecord, InterruptionState, PausedClock, Player, SessionState,
};
