//! Heuristic judge: five axes, winner and quoted feedback
//!
//! Pure and deterministic: the same transcript and topic always give the
//! same scores, winner and bullets.

use std::collections::BTreeSet;

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{
    AxisScores, InterruptionRecord, Judgment, PerTeam, SessionState, SideJudgment, Team, Winner,
};
use crate::{
    ACCEPTED_INTERRUPTION_CLARITY, AXIS_MAX, CIVILITY_PER_INCIVILITY, CLARITY_BASE,
    CLARITY_CONCISION_BONUS, CLARITY_LONG_SENTENCE_PENALTY, CLARITY_SENTENCE_BONUS_MIN,
    CLARITY_VOLUME_BONUS, EVIDENCE_BASE, EVIDENCE_PER_CITATION, IRAC_BASE, IRAC_PER_MARKER,
    LONG_SENTENCE_WORDS, MAX_FEEDBACK_BULLETS, REJECTED_INTERRUPTION_CIVILITY, RELEVANCE_BASE,
    RELEVANCE_SPAN, TIE_MARGIN, YIELDED_INTERRUPTION_IRAC,
};

lazy_static! {
    static ref RE_SENTENCE_END: Regex = Regex::new(r"[.!?]+").unwrap();

    static ref RE_WORD: Regex = Regex::new(r"\w+").unwrap();

    // Evidence: statutes, articles, cases, years, attributions
    static ref RE_CITATION: Regex = Regex::new(
        r"(?i)\b(according to|statute|section \d+|article \d+|act|case|precedent|(?:1[89]|20)\d{2})\b"
    ).unwrap();

    // Evidence: "Smith v Jones" style case names
    static ref RE_CASE_NAME: Regex = Regex::new(r"\b[A-Z][a-z]+ v\.? [A-Z][a-z]+").unwrap();

    // IRAC structure
    static ref RE_STRUCTURE: Regex = Regex::new(
        r"(?i)\b(issue|rule|apply|applies|applying|application|therefore|conclude|concludes|conclusion|thus|hence)\b"
    ).unwrap();

    static ref RE_ISSUE: Regex = Regex::new(r"(?i)\bissue\b").unwrap();

    static ref RE_CONCLUSION: Regex = Regex::new(
        r"(?i)\b(conclude|concludes|concluded|conclusion|therefore|thus|hence)\b"
    ).unwrap();

    static ref RE_INCIVILITY: Regex = Regex::new(
        r"(?i)\b(idiot|idiots|idiotic|stupid|dumb|moron|morons|liar|liars|shut up|pathetic|ridiculous|nonsense|clown|clowns|hate you)\b"
    ).unwrap();
}

/// Words quoted from an over-long sentence
const QUOTE_WORDS: usize = 8;

/// Deterministic fallback judge
#[derive(Debug, Default)]
pub struct HeuristicJudge;

impl HeuristicJudge {
    /// Create new judge
    pub fn new() -> Self {
        Self
    }

    /// Judge a recorded session
    pub fn score_session(&self, session: &SessionState) -> Judgment {
        let texts = PerTeam::new(side_text(session, Team::A), side_text(session, Team::B));
        self.score(&session.config.topic, &texts, session.interruptions())
    }

    /// Judge both sides' text, then apply interruption adjustments
    pub fn score(
        &self,
        topic: &str,
        texts: &PerTeam<String>,
        interruptions: &[InterruptionRecord],
    ) -> Judgment {
        let mut scores = PerTeam::new(
            self.score_text(topic, &texts.a),
            self.score_text(topic, &texts.b),
        );
        apply_interruptions(&mut scores, interruptions);
        let scores = PerTeam::new(scores.a.clamped(), scores.b.clamped());

        let side = |team: Team| {
            let axes = *scores.get(team);
            let total = axes.total();
            SideJudgment {
                team,
                scores: axes,
                total,
                scaled: scale_to_100(total),
                feedback: self.feedback(topic, texts.get(team)),
            }
        };
        let sides = PerTeam::new(side(Team::A), side(Team::B));

        let diff = sides.a.total - sides.b.total;
        let winner = if diff.abs() < TIE_MARGIN {
            Winner::Tie
        } else if diff > 0.0 {
            Winner::Affirmative
        } else {
            Winner::Negative
        };
        let scaled_gap = round1((sides.a.scaled - sides.b.scaled).abs());
        let margin = match winner {
            Winner::Tie => None,
            _ => Some(margin_label(scaled_gap).to_string()),
        };
        let final_statement = final_statement(winner, sides.a.scaled, sides.b.scaled, scaled_gap);

        Judgment {
            winner,
            sides,
            margin,
            final_statement,
        }
    }

    /// Base axis scores for one side, before interruption adjustments
    pub fn score_text(&self, topic: &str, text: &str) -> AxisScores {
        let sentences = sentences(text);
        let long = sentences.iter().filter(|s| is_long(s)).count();

        let mut clarity = CLARITY_BASE - CLARITY_LONG_SENTENCE_PENALTY * long as f64;
        if sentences.len() > CLARITY_SENTENCE_BONUS_MIN {
            clarity += CLARITY_VOLUME_BONUS;
        }
        if !sentences.is_empty() && long == 0 {
            clarity += CLARITY_CONCISION_BONUS;
        }

        let relevance = RELEVANCE_BASE + RELEVANCE_SPAN * keyword_coverage(topic, text);
        let evidence = EVIDENCE_BASE + EVIDENCE_PER_CITATION * citation_count(text) as f64;
        let irac = IRAC_BASE + IRAC_PER_MARKER * count(&RE_STRUCTURE, text) as f64;
        let civility = AXIS_MAX - CIVILITY_PER_INCIVILITY * count(&RE_INCIVILITY, text) as f64;

        AxisScores {
            clarity,
            relevance,
            evidence,
            irac,
            civility,
        }
        .clamped()
    }

    /// Up to five rule-based bullets; never empty
    pub fn feedback(&self, topic: &str, text: &str) -> Vec<String> {
        let mut bullets = Vec::new();

        if !RE_ISSUE.is_match(text) {
            bullets.push(format!(
                "State the issue explicitly, e.g. \"The issue is whether {}.\"",
                topic.trim().trim_end_matches(['.', '?', '!'])
            ));
        }
        if citation_count(text) == 0 {
            bullets.push(
                "Cite a source for your key claim: a statute, a case, or \"According to ...\"."
                    .to_string(),
            );
        }
        if let Some(sentence) = sentences(text).into_iter().find(|s| is_long(s)) {
            let opening: Vec<&str> = sentence.split_whitespace().take(QUOTE_WORDS).collect();
            bullets.push(format!(
                "Split long sentences: \"{}...\" runs past {} words.",
                opening.join(" "),
                LONG_SENTENCE_WORDS
            ));
        }
        if !RE_CONCLUSION.is_match(text) {
            bullets.push(
                "Finish with an explicit conclusion (\"Therefore, ...\") that answers the topic."
                    .to_string(),
            );
        }
        if !text.trim_end().ends_with('?') {
            bullets.push(
                "Use interruption windows to ask or answer pointed questions.".to_string(),
            );
        }

        if bullets.is_empty() {
            bullets.push(
                "Clear, well-supported and well-structured case; keep that discipline under pressure."
                    .to_string(),
            );
        }
        bullets.truncate(MAX_FEEDBACK_BULLETS);
        bullets
    }
}

/// All of a team's recorded words, in order
pub fn side_text(session: &SessionState, team: Team) -> String {
    session
        .turns_for(team)
        .map(|t| t.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Accepted: requester +clarity, yielding side +IRAC. Rejected: requester -civility.
fn apply_interruptions(scores: &mut PerTeam<AxisScores>, interruptions: &[InterruptionRecord]) {
    for record in interruptions {
        if record.accepted {
            scores.get_mut(record.by).clarity += ACCEPTED_INTERRUPTION_CLARITY;
            scores.get_mut(record.by.opponent()).irac += YIELDED_INTERRUPTION_IRAC;
        } else {
            scores.get_mut(record.by).civility -= REJECTED_INTERRUPTION_CIVILITY;
        }
    }
}

/// Non-empty sentences, split on terminal punctuation
fn sentences(text: &str) -> Vec<&str> {
    RE_SENTENCE_END
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_long(sentence: &str) -> bool {
    sentence.split_whitespace().count() > LONG_SENTENCE_WORDS
}

/// Lowercased word tokens
fn tokens(text: &str) -> BTreeSet<String> {
    RE_WORD
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Fraction of topic keywords that appear in the text
fn keyword_coverage(topic: &str, text: &str) -> f64 {
    let keywords = tokens(topic);
    if keywords.is_empty() {
        return 0.0;
    }
    let words = tokens(text);
    let hits = keywords.iter().filter(|k| words.contains(*k)).count();
    hits as f64 / keywords.len() as f64
}

fn citation_count(text: &str) -> usize {
    count(&RE_CITATION, text) + count(&RE_CASE_NAME, text)
}

/// Count regex matches in text
fn count(regex: &Regex, text: &str) -> usize {
    regex.find_iter(text).count()
}

/// Five axes out of 25, rescaled to /100
pub fn scale_to_100(total: f64) -> f64 {
    round1(total / (5.0 * AXIS_MAX) * 100.0)
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Describe a winning gap on the /100 scale
pub fn margin_label(gap: f64) -> &'static str {
    let gap = gap.abs();
    if gap <= 2.0 {
        "very close"
    } else if gap <= 5.0 {
        "close but clear"
    } else if gap <= 10.0 {
        "clear win"
    } else if gap <= 20.0 {
        "dominant win"
    } else {
        "overwhelming win"
    }
}

fn final_statement(winner: Winner, aff: f64, neg: f64, gap: f64) -> String {
    match winner {
        Winner::Tie => format!("The round is a TIE. Final (/100): AFF {} - NEG {}.", aff, neg),
        _ => format!(
            "Congratulations, Team {}! You win by {} points ({}). Final (/100): AFF {} - NEG {}.",
            winner,
            gap,
            margin_label(gap),
            aff,
            neg
        ),
    }
}

// =============================================================================
// TESTS
// =============================================================================
