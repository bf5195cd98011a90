//! League match, its stage, status, and elimination forward link.

use crate::models::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a match (opaque, issued by the league service).
pub type MatchId = String;

/// Stage of the league this match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Round-robin group play.
    Preliminary,
    /// Same-rank doubles pairings across groups.
    Ranked,
    /// Single-elimination bracket.
    Elimination,
}

impl Stage {
    pub fn is_final_stage(self) -> bool {
        !matches!(self, Stage::Preliminary)
    }
}

/// Match progress. Only moves forward: scheduled, in progress, completed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
}

/// Which side of the successor match the winner of an elimination match fills.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextSlot {
    TeamA,
    TeamB,
}

/// A single scheduled match as reported by the league service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeagueMatch {
    pub id: MatchId,
    pub league_id: String,
    /// 1-based.
    pub round: u32,
    pub group_number: u32,
    pub stage: Stage,
    pub player_a: String,
    pub player_b: String,
    pub court: String,
    #[serde(with = "timestamp")]
    pub scheduled_at: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub score_a: Option<u64>,
    #[serde(default)]
    pub score_b: Option<u64>,
    /// Label of the winning side; trusted as reported, never computed here.
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default, with = "timestamp::option")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Elimination only: the match this match's winner feeds into.
    #[serde(default)]
    pub next_match_id: Option<MatchId>,
    #[serde(default)]
    pub next_match_slot: Option<NextSlot>,
}

impl LeagueMatch {
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed
    }

    pub fn is_final_stage(&self) -> bool {
        self.stage.is_final_stage()
    }
}
