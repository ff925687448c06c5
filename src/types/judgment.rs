//! Judging results: heuristic scores and external verdicts

use serde::{Deserialize, Serialize};

use crate::types::{PerTeam, Team};
use crate::AXIS_MAX;

/// Five-axis heuristic score, each axis in [0, 5]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisScores {
    /// Sentence length discipline
    pub clarity: f64,
    /// Topic keyword coverage
    pub relevance: f64,
    /// Citation-like markers
    pub evidence: f64,
    /// Issue/Rule/Application/Conclusion markers
    pub irac: f64,
    /// Absence of uncivil language
    pub civility: f64,
}

impl AxisScores {
    /// Sum of all five axes
    pub fn total(&self) -> f64 {
        self.clarity + self.relevance + self.evidence + self.irac + self.civility
    }

    /// Clamp every axis into [0, AXIS_MAX]
    pub fn clamped(self) -> Self {
        Self {
            clarity: self.clarity.clamp(0.0, AXIS_MAX),
            relevance: self.relevance.clamp(0.0, AXIS_MAX),
            evidence: self.evidence.clamp(0.0, AXIS_MAX),
            irac: self.irac.clamp(0.0, AXIS_MAX),
            civility: self.civility.clamp(0.0, AXIS_MAX),
        }
    }
}

/// Scores and feedback for one side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SideJudgment {
    pub team: Team,
    pub scores: AxisScores,
    pub total: f64,
    /// total rescaled to /100
    pub scaled: f64,
    /// 1 to 5 bullets, quoting the side where possible
    pub feedback: Vec<String>,
}

/// Outcome of a debate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Winner {
    Affirmative,
    Negative,
    Tie,
}

impl Winner {
    pub fn team(self) -> Option<Team> {
        match self {
            Winner::Affirmative => Some(Team::A),
            Winner::Negative => Some(Team::B),
            Winner::Tie => None,
        }
    }
}

impl From<Team> for Winner {
    fn from(team: Team) -> Self {
        match team {
            Team::A => Winner::Affirmative,
            Team::B => Winner::Negative,
        }
    }
}

impl std::fmt::Display for Winner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Winner::Affirmative => "AFFIRMATIVE",
            Winner::Negative => "NEGATIVE",
            Winner::Tie => "TIE",
        };
        write!(f, "{}", name)
    }
}

/// Deterministic heuristic judgment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Judgment {
    pub winner: Winner,
    pub sides: PerTeam<SideJudgment>,
    /// e.g. "clear win"; absent for a tie
    #[serde(skip_serializing_if = "Option::is_none")]
    pub margin: Option<String>,
    pub final_statement: String,
}

/// Structured answer of the external judging process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalVerdict {
    pub winner: Winner,
    /// Affirmative score out of 100
    pub affirmative: f64,
    /// Negative score out of 100
    pub negative: f64,
    #[serde(default)]
    pub summary: String,
}

/// Verdict from whichever judge produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Verdict {
    Heuristic(Judgment),
    External(ExternalVerdict),
}

impl Verdict {
    pub fn winner(&self) -> Winner {
        match self {
            Verdict::Heuristic(j) => j.winner,
            Verdict::External(v) => v.winner,
        }
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, Verdict::Heuristic(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_bounds_every_axis() {
        let scores = AxisScores {
            clarity: 5.2,
            relevance: -0.1,
            evidence: 7.0,
            irac: 2.0,
            civility: -3.0,
        }
        .clamped();
        assert_eq!(scores.clarity, 5.0);
        assert_eq!(scores.relevance, 0.0);
        assert_eq!(scores.evidence, 5.0);
        assert_eq!(scores.irac, 2.0);
        assert_eq!(scores.civility, 0.0);
        assert!((scores.total() - 12.0).abs() < 1e-9);
    }

    #[test]
    fn test_winner_wire_names() {
        assert_eq!(serde_json::to_string(&Winner::Negative).unwrap(), "\"NEGATIVE\"");
        assert_eq!(Winner::from(Team::A), Winner::Affirmative);
        assert_eq!(Winner::Tie.team(), None);
    }

    #[test]
    fn test_external_verdict_tagged() {
        let verdict = Verdict::External(ExternalVerdict {
            winner: Winner::Tie,
            affirmative: 50.0,
            negative: 50.0,
            summary: String::new(),
        });
        let json = serde_json::to_value(&verdict).unwrap();
        assert_eq!(json["source"], "external");
        assert_eq!(json["winner"], "TIE");
        assert!(!verdict.is_heuristic());
    }
}
