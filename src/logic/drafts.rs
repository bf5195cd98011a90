//! Per-match scratch buffers: schedule/court edits and score entry.
//! Created on edit start or first keystroke, dropped on success or cancel.

use crate::gateway::ScoreUpdate;
use crate::models::LeagueMatch;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Draft schedule and court for a match in edit mode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct EditDraft {
    pub scheduled_at: DateTime<Utc>,
    pub court: String,
}

impl EditDraft {
    /// Seed from the match's current values.
    pub fn from_match(m: &LeagueMatch) -> Self {
        Self {
            scheduled_at: m.scheduled_at,
            court: m.court.clone(),
        }
    }

    /// Trimmed court, or None when blank.
    pub fn court(&self) -> Option<&str> {
        let court = self.court.trim();
        (!court.is_empty()).then_some(court)
    }
}

/// Free-text score fields for one match, plus its inline error and in-flight flag.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ScoreDraft {
    pub score_a: String,
    pub score_b: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl ScoreDraft {
    pub fn new(score_a: impl Into<String>, score_b: impl Into<String>) -> Self {
        Self {
            score_a: score_a.into(),
            score_b: score_b.into(),
            ..Self::default()
        }
    }

    /// Both fields as a score pair, if they are valid.
    pub fn parse(&self) -> Option<ScoreUpdate> {
        parse_scores(&self.score_a, &self.score_b)
    }
}

/// A score is a base-10 integer >= 0. The service decides what a valid score is.
pub fn parse_score(raw: &str) -> Option<u64> {
    raw.trim().parse().ok()
}

pub fn parse_scores(score_a: &str, score_b: &str) -> Option<ScoreUpdate> {
    Some(ScoreUpdate {
        score_a: parse_score(score_a)?,
        score_b: parse_score(score_b)?,
    })
}
