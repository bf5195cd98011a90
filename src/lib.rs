//! Tennis club league organizer: league view engine, league service gateway, member session.

pub mod config;
pub mod gateway;
pub mod logic;
pub mod models;
pub mod session;

pub use config::Config;
pub use gateway::{
    BracketRequest, ErrorKind, FinalStageRequest, GatewayError, HttpGateway, LeagueApi,
    MatchUpdate, ScoreUpdate,
};
pub use logic::{
    classify, create_league, fetch_league_data, require_admin, ActionError, Bucket, EditDraft,
    FilterKey, FinalModePolicy, FinalStageDialog, GenerationInputs, GroupKey, LeagueData,
    LeagueView, LoadOutcome, LoadPhase, LoadTicket, RankedMatchCount, RenderedView, ScoreDraft,
    StageLabel, ViewMode,
};
pub use models::{
    ApplicantSnapshot, Application, FinalStageMode, League, LeagueId, LeagueMatch, Level, MatchId,
    MatchStatus, Member, MemberId, NewLeague, NewMember, NextSlot, PlayerRanking,
    PreliminaryStatus, Role, Stage,
};
pub use session::{
    JsonFileStorage, MemberSession, MemoryStorage, SessionError, SessionStorage, StoredSession,
    Theme,
};
