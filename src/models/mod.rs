//! Data structures for the league: leagues, matches, applications, members.

mod application;
mod game;
mod league;
mod member;
pub mod timestamp;

pub use application::{ApplicantSnapshot, Application};
pub use game::{LeagueMatch, MatchId, MatchStatus, NextSlot, Stage};
pub use league::{
    count_in_range, FinalStageMode, League, LeagueId, NewLeague, PlayerRanking, PreliminaryStatus,
    MAX_COUNT, MIN_COUNT,
};
pub use member::{Level, Member, MemberId, NewMember, Role};
