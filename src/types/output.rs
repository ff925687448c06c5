//! Realtime surface: state snapshots, discrete events and inbound commands

use serde::{Deserialize, Serialize};

use crate::types::{Phase, PerTeam, SessionState, Team, Winner};

/// Periodic state broadcast
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSnapshot {
    pub debate_id: String,
    pub topic: String,
    pub phase: Phase,
    pub remaining: u32,
    pub floor: Team,
    pub team_size: u32,
    pub interruptions_left: PerTeam<u32>,
}

impl StateSnapshot {
    pub fn of(session: &SessionState) -> Self {
        Self {
            debate_id: session.config.debate_id.clone(),
            topic: session.config.topic.clone(),
            phase: session.phase,
            remaining: session.remaining,
            floor: session.floor,
            team_size: session.config.team_size,
            interruptions_left: session.interruptions_left,
        }
    }

    /// Format for terminal display (with colors)
    pub fn to_terminal_string(&self) -> String {
        format!(
            "{}[{}] {:>3}s | floor={} | tokens A={} B={}{}",
            self.phase.color_code(),
            self.phase,
            self.remaining,
            self.floor,
            self.interruptions_left.a,
            self.interruptions_left.b,
            Phase::color_reset()
        )
    }

    /// Format for parseable output (no colors)
    pub fn to_parseable_string(&self) -> String {
        format!(
            "phase={} | remaining={} | floor={} | tokens={}/{}",
            self.phase,
            self.remaining,
            self.floor,
            self.interruptions_left.a,
            self.interruptions_left.b
        )
    }
}

/// Everything pushed to realtime subscribers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DebateEvent {
    State(StateSnapshot),
    InterruptionStarted { by: Team, seconds: u32 },
    InterruptionRejected { by: Team },
    InterruptionEnded,
    DebateComplete { winner: Winner },
}

/// Commands accepted over the realtime socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RealtimeCommand {
    Start,
    RequestInterrupt { team: Team },
    RejectInterrupt,
    EndInterrupt,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DebateConfig;

    #[test]
    fn test_snapshot_wire_shape() {
        let session = SessionState::new(DebateConfig::new("d-9", "Topic", 3), Vec::new()).unwrap();
        let json = serde_json::to_value(DebateEvent::State(StateSnapshot::of(&session))).unwrap();
        assert_eq!(json["type"], "state");
        assert_eq!(json["debateId"], "d-9");
        assert_eq!(json["teamSize"], 3);
        assert_eq!(json["interruptionsLeft"]["B"], 2);
    }

    #[test]
    fn test_parseable_string() {
        let session = SessionState::new(DebateConfig::new("d", "t", 1), Vec::new()).unwrap();
        let line = StateSnapshot::of(&session).to_parseable_string();
        assert!(line.contains("phase=LOBBY"));
        assert!(line.contains("floor=A"));
    }

    #[test]
    fn test_commands_parse() {
        let cmd: RealtimeCommand =
            serde_json::from_str(r#"{"type":"request_interrupt","team":"B"}"#).unwrap();
        assert_eq!(cmd, RealtimeCommand::RequestInterrupt { team: Team::B });
        let cmd: RealtimeCommand = serde_json::from_str(r#"{"type":"end_interrupt"}"#).unwrap();
        assert_eq!(cmd, RealtimeCommand::EndInterrupt);
    }

    #[test]
    fn test_interruption_event_shape() {
        let json = serde_json::to_value(DebateEvent::InterruptionStarted { by: Team::A, seconds: 15 })
            .unwrap();
        assert_eq!(json["type"], "interruptionStarted");
        assert_eq!(json["seconds"], 15);
    }
}
