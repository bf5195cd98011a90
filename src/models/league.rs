//! League, its final-stage mode, creation payload, and stage progress reports.

use crate::models::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a league (opaque, issued by the league service).
pub type LeagueId = String;

/// Inclusive bounds for group and court counts.
pub const MIN_COUNT: u32 = 1;
pub const MAX_COUNT: u32 = 16;

const MAX_NAME_LEN: usize = 70;
const MIN_PARTICIPANTS: u32 = 2;
const MAX_PARTICIPANTS: u32 = 128;

/// How the final stage is played once group play is over.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalStageMode {
    /// Same-rank doubles pairings across groups.
    #[default]
    RankedPlay,
    /// Single-elimination bracket from the top-ranked entrants.
    Elimination,
}

/// A club league as reported by the league service.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub surface_type: String,
    pub entry_fee: i64,
    pub max_participants: u32,
    #[serde(default)]
    pub auto_generate_bracket: bool,
    #[serde(default)]
    pub groups_count: Option<u32>,
    #[serde(default)]
    pub courts_count: Option<u32>,
    /// Present once the preliminary bracket exists.
    #[serde(default, with = "timestamp::option")]
    pub bracket_generated_at: Option<DateTime<Utc>>,
    /// Set only once final-stage matches exist.
    #[serde(default)]
    pub final_stage_mode: Option<FinalStageMode>,
    #[serde(default, with = "timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl League {
    pub fn bracket_generated(&self) -> bool {
        self.bracket_generated_at.is_some()
    }
}

/// Payload for creating a league.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewLeague {
    pub name: String,
    pub surface_type: String,
    pub entry_fee: i64,
    pub max_participants: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_generate_bracket: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub courts_count: Option<u32>,
}

impl NewLeague {
    /// Check the payload against the service's limits before sending it.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("League name is required".into());
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(format!("League name must be at most {MAX_NAME_LEN} characters"));
        }
        if self.entry_fee < 0 {
            return Err("Entry fee cannot be negative".into());
        }
        if !(MIN_PARTICIPANTS..=MAX_PARTICIPANTS).contains(&self.max_participants) {
            return Err(format!(
                "Max participants must be between {MIN_PARTICIPANTS} and {MAX_PARTICIPANTS}"
            ));
        }
        for (label, count) in [("Groups", self.groups_count), ("Courts", self.courts_count)] {
            if let Some(n) = count {
                if !count_in_range(n) {
                    return Err(format!(
                        "{label} count must be between {MIN_COUNT} and {MAX_COUNT}"
                    ));
                }
            }
        }
        Ok(())
    }
}

pub fn count_in_range(n: u32) -> bool {
    (MIN_COUNT..=MAX_COUNT).contains(&n)
}

/// Progress of the preliminary stage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PreliminaryStatus {
    pub is_complete: bool,
    pub total_matches: u32,
    pub completed_matches: u32,
}

/// One row of a group standings table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerRanking {
    pub player_name: String,
    pub group_number: u32,
    pub wins: u32,
    pub losses: u32,
    pub points_for: i64,
    pub points_against: i64,
    pub points_diff: i64,
    pub matches_played: u32,
    pub win_rate: f64,
}
