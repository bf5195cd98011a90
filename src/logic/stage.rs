//! Stage classifier: display category for a match.

use crate::models::{LeagueMatch, Stage};
use serde::Serialize;
use std::fmt;

/// Human-facing stage label of a match.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StageLabel {
    Group { number: u32 },
    RankedPlay,
    Quarterfinal,
    Semifinal,
    Final,
    /// Elimination round with no named label (opening rounds of big draws).
    MainDraw { round: u32 },
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageLabel::Group { number } => write!(f, "group {number}"),
            StageLabel::RankedPlay => write!(f, "ranked play"),
            StageLabel::Quarterfinal => write!(f, "quarterfinal"),
            StageLabel::Semifinal => write!(f, "semifinal"),
            StageLabel::Final => write!(f, "final"),
            StageLabel::MainDraw { .. } => write!(f, "main draw"),
        }
    }
}

/// Classify a match by its stage and round.
pub fn classify(m: &LeagueMatch) -> StageLabel {
    match m.stage {
        Stage::Elimination => match m.round {
            2 => StageLabel::Quarterfinal,
            3 => StageLabel::Semifinal,
            4 => StageLabel::Final,
            round => StageLabel::MainDraw { round },
        },
        Stage::Ranked => StageLabel::RankedPlay,
        Stage::Preliminary => StageLabel::Group {
            number: m.group_number,
        },
    }
}
