//! Plain-text debate transcripts
//!
//! One line per recorded turn: `[mm:ss SIDE-slot] text`, where SIDE is `AFF`
//! or `NEG`, slot is the speaker's roster position from 1, and `Reply` marks
//! a conclusion. This is what external judges and the CLI read.

use std::fmt;

use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{PerTeam, SessionState, Team};

lazy_static! {
    static ref RE_LINE: Regex =
        Regex::new(r"^\[(\d+):(\d{2}) (AFF|NEG)-(\d+|Reply)\]\s*(.*)$").unwrap();
}

/// Below this many lines a transcript is not worth an external judge
const MIN_SPEECH_LINES: usize = 3;

/// Below this much spoken text a transcript is not worth an external judge
const MIN_PAYLOAD_CHARS: usize = 120;

/// Position of a turn within its side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    /// Speech by the n-th roster member of the side, from 1
    Speech(u32),
    /// Conclusion
    Reply,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Speech(n) => write!(f, "{}", n),
            Slot::Reply => write!(f, "Reply"),
        }
    }
}

/// One transcript line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub offset_secs: u64,
    pub side: Team,
    pub slot: Slot,
    pub text: String,
}

impl fmt::Display for TranscriptLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{:02}:{:02} {}-{}] {}",
            self.offset_secs / 60,
            self.offset_secs % 60,
            self.side.side_label(),
            self.slot,
            self.text
        )
    }
}

/// Lines for every recorded turn, in capture order
pub fn transcript_lines(session: &SessionState) -> Vec<TranscriptLine> {
    let turns = session.audio_turns();
    let origin: Option<DateTime<Utc>> = session
        .started_at
        .or_else(|| turns.first().map(|t| t.captured_at));

    turns
        .iter()
        .map(|turn| {
            // chunks of one speech share the speaker's slot
            let slot = if turn.phase.is_conclusion() {
                Slot::Reply
            } else {
                Slot::Speech(turn.speaker_idx.max(0) as u32 + 1)
            };
            let offset_secs = origin
                .map(|o| (turn.captured_at - o).num_seconds().max(0) as u64)
                .unwrap_or(0);
            TranscriptLine {
                offset_secs,
                side: turn.team,
                slot,
                text: turn.text.trim().to_string(),
            }
        })
        .collect()
}

/// Render the session as transcript text
pub fn format_transcript(session: &SessionState) -> String {
    transcript_lines(session)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Read transcript lines back, skipping anything that does not match
pub fn parse_transcript(text: &str) -> Vec<TranscriptLine> {
    text.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<TranscriptLine> {
    let caps = RE_LINE.captures(line.trim())?;
    let minutes: u64 = caps[1].parse().ok()?;
    let seconds: u64 = caps[2].parse().ok()?;
    let side = Team::from_side_label(&caps[3])?;
    let slot = match &caps[4] {
        "Reply" => Slot::Reply,
        n => Slot::Speech(n.parse().ok()?),
    };
    Some(TranscriptLine {
        offset_secs: minutes * 60 + seconds,
        side,
        slot,
        text: caps[5].trim().to_string(),
    })
}

/// Too thin to send to an external judge
pub fn is_low_content(transcript: &str) -> bool {
    let lines = parse_transcript(transcript);
    let payload: usize = lines.iter().map(|l| l.text.chars().count()).sum();
    lines.len() < MIN_SPEECH_LINES || payload < MIN_PAYLOAD_CHARS
}

/// Each side's words joined, for the heuristic judge
pub fn side_texts(lines: &[TranscriptLine]) -> PerTeam<String> {
    let join = |team: Team| {
        lines
            .iter()
            .filter(|l| l.side == team && !l.text.is_empty())
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    };
    PerTeam::new(join(Team::A), join(Team::B))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AudioTurn, DebateConfig, Phase};
    use chrono::Duration;

    fn turn(at: DateTime<Utc>, phase: Phase, speaker_idx: i32, text: &str) -> AudioTurn {
        AudioTurn {
            phase,
            team: phase.team().unwrap(),
            speaker_id: None,
            speaker_idx,
            source: format!("text:{}", text),
            text: text.to_string(),
            duration_ms: 1000,
            captured_at: at,
        }
    }

    fn recorded() -> SessionState {
        let mut s = SessionState::new(DebateConfig::new("d-1", "topic", 3), Vec::new()).unwrap();
        let t0 = Utc::now();
        s.started_at = Some(t0);
        s.push_audio_turn(turn(t0 + Duration::seconds(125), Phase::SpeechA, 0, "Opening."));
        s.push_audio_turn(turn(t0 + Duration::seconds(310), Phase::SpeechB, 0, "Rebuttal."));
        s.push_audio_turn(turn(t0 + Duration::seconds(495), Phase::SpeechA, 1, " Second. "));
        s.push_audio_turn(turn(t0 + Duration::seconds(900), Phase::ConclusionB, 2, "Closing."));
        s
    }

    #[test]
    fn test_format_lines() {
        let text = format_transcript(&recorded());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[02:05 AFF-1] Opening.");
        assert_eq!(lines[1], "[05:10 NEG-1] Rebuttal.");
        assert_eq!(lines[2], "[08:15 AFF-2] Second.");
        assert_eq!(lines[3], "[15:00 NEG-Reply] Closing.");
    }

    #[test]
    fn test_chunked_speech_keeps_speaker_slot() {
        let mut s = SessionState::new(DebateConfig::new("d-1", "topic", 1), Vec::new()).unwrap();
        let t0 = Utc::now();
        s.started_at = Some(t0);
        s.push_audio_turn(turn(t0, Phase::SpeechA, 0, "first chunk."));
        s.push_audio_turn(turn(t0, Phase::SpeechA, 0, "second chunk."));
        let text = format_transcript(&s);
        assert_eq!(text, "[00:00 AFF-1] first chunk.\n[00:00 AFF-1] second chunk.");
    }

    #[test]
    fn test_slots_stay_within_roster() {
        let mut s = SessionState::new(DebateConfig::new("d-1", "topic", 3), Vec::new()).unwrap();
        let t0 = Utc::now();
        s.started_at = Some(t0);
        for idx in [0, 0, 1, 2, 2] {
            s.push_audio_turn(turn(t0, Phase::SpeechB, idx, "point."));
        }
        let slots: Vec<Slot> = transcript_lines(&s).into_iter().map(|l| l.slot).collect();
        assert_eq!(
            slots,
            vec![Slot::Speech(1), Slot::Speech(1), Slot::Speech(2), Slot::Speech(3), Slot::Speech(3)]
        );
    }

    #[test]
    fn test_empty_session_formats_empty() {
        let s = SessionState::new(DebateConfig::new("d-1", "topic", 1), Vec::new()).unwrap();
        assert_eq!(format_transcript(&s), "");
    }

    #[test]
    fn test_parse_skips_noise() {
        let text = "Motion: X\n[00:10 AFF-1] We propose.\n\n[01:00 NEG-Reply]   We oppose.\nnot a line";
        let lines = parse_transcript(text);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].side, Team::A);
        assert_eq!(lines[0].slot, Slot::Speech(1));
        assert_eq!(lines[1].offset_secs, 60);
        assert_eq!(lines[1].slot, Slot::Reply);
        assert_eq!(lines[1].text, "We oppose.");
    }

    #[test]
    fn test_low_content() {
        assert!(is_low_content(""));
        assert!(is_low_content("[00:01 AFF-1] Short.\n[00:02 NEG-1] Short.\n[00:03 AFF-2] Short."));

        let long = "x".repeat(60);
        let rich = format!(
            "[00:01 AFF-1] {l}\n[00:02 NEG-1] {l}\n[00:03 AFF-2] {l}",
            l = long
        );
        assert!(!is_low_content(&rich));
    }

    #[test]
    fn test_side_texts() {
        let lines = parse_transcript("[00:01 AFF-1] One.\n[00:02 NEG-1] Two.\n[00:03 AFF-Reply] Three.");
        let texts = side_texts(&lines);
        assert_eq!(texts.a, "One. Three.");
        assert_eq!(texts.b, "Two.");
    }
}
