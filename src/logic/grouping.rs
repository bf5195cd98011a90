//! Match grouping and filtering: preliminary/final partition, group buckets,
//! visible subset for the current view, and the next match to be played.

use crate::models::{FinalStageMode, LeagueMatch};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which stage's matches are displayed.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Preliminary,
    Final,
}

/// Key of a preliminary group bucket, rendered as `group-{n}`.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct GroupKey(pub u32);

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group-{}", self.0)
    }
}

/// Group filter selection: everything, or one group.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum FilterKey {
    #[default]
    All,
    Group(GroupKey),
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterKey::All => write!(f, "all"),
            FilterKey::Group(key) => key.fmt(f),
        }
    }
}

impl FromStr for FilterKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(FilterKey::All);
        }
        s.strip_prefix("group-")
            .and_then(|n| n.parse().ok())
            .map(|n| FilterKey::Group(GroupKey(n)))
            .ok_or_else(|| format!("unknown group filter: {s}"))
    }
}

impl Serialize for FilterKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FilterKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A labelled set of matches shown together.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub label: String,
    pub matches: Vec<LeagueMatch>,
}

/// Split into (preliminary, final-stage), preserving order.
pub fn partition(matches: &[LeagueMatch]) -> (Vec<LeagueMatch>, Vec<LeagueMatch>) {
    let (finals, preliminary): (Vec<_>, Vec<_>) =
        matches.iter().cloned().partition(|m| m.is_final_stage());
    (preliminary, finals)
}

pub fn has_final_stage(matches: &[LeagueMatch]) -> bool {
    matches.iter().any(|m| m.is_final_stage())
}

fn sort_by_time(matches: &mut [LeagueMatch]) {
    matches.sort_by_key(|m| m.scheduled_at);
}

/// One bucket per distinct group number, in order of first occurrence; matches sorted by time.
pub fn group_buckets(preliminary: &[LeagueMatch]) -> Vec<Bucket> {
    let mut order: Vec<u32> = Vec::new();
    for m in preliminary {
        if !order.contains(&m.group_number) {
            order.push(m.group_number);
        }
    }
    order
        .into_iter()
        .map(|n| {
            let mut matches: Vec<_> = preliminary
                .iter()
                .filter(|m| m.group_number == n)
                .cloned()
                .collect();
            sort_by_time(&mut matches);
            Bucket {
                key: GroupKey(n).to_string(),
                label: format!("group {n}"),
                matches,
            }
        })
        .collect()
}

/// Label of the single final-stage bucket.
pub fn final_stage_label(mode: Option<FinalStageMode>) -> &'static str {
    match mode {
        Some(FinalStageMode::RankedPlay) => "ranked play",
        Some(FinalStageMode::Elimination) => "tournament",
        None => "main draw",
    }
}

/// The final stage as a single bucket sorted by time. None when there are no final matches.
pub fn final_bucket(finals: &[LeagueMatch], mode: Option<FinalStageMode>) -> Option<Bucket> {
    if finals.is_empty() {
        return None;
    }
    let mut matches = finals.to_vec();
    sort_by_time(&mut matches);
    Some(Bucket {
        key: "final-stage".to_string(),
        label: final_stage_label(mode).to_string(),
        matches,
    })
}

/// Matches shown for the current mode and filter. The filter is ignored in final mode.
pub fn visible_matches(
    mode: ViewMode,
    filter: FilterKey,
    preliminary: &[LeagueMatch],
    finals: &[LeagueMatch],
) -> Vec<LeagueMatch> {
    match (mode, filter) {
        (ViewMode::Final, _) => {
            let mut matches = finals.to_vec();
            sort_by_time(&mut matches);
            matches
        }
        (ViewMode::Preliminary, FilterKey::All) => preliminary.to_vec(),
        (ViewMode::Preliminary, FilterKey::Group(key)) => preliminary
            .iter()
            .filter(|m| GroupKey(m.group_number) == key)
            .cloned()
            .collect(),
    }
}

/// Earliest scheduled match across the whole set, regardless of filter, mode or status.
/// None only when there are no matches.
pub fn next_match(matches: &[LeagueMatch]) -> Option<&LeagueMatch> {
    matches.iter().min_by_key(|m| m.scheduled_at)
}

/// Filter to use after the match set changed. Only an unset filter is seeded;
/// an explicit selection, including `All`, is kept.
pub fn seed_filter(current: Option<FilterKey>, buckets: &[Bucket]) -> Option<FilterKey> {
    match current {
        Some(filter) => Some(filter),
        None => buckets.first().and_then(|b| b.key.parse().ok()),
    }
}
