//! League view engine: stage labels, grouping, view reconciler, admin actions, drafts.

mod actions;
mod drafts;
mod grouping;
mod stage;
mod view;

pub use actions::{
    create_league, require_admin, ActionError, FinalStageDialog, GenerationInputs, RankedMatchCount,
};
pub use drafts::{parse_score, parse_scores, EditDraft, ScoreDraft};
pub use grouping::{
    final_bucket, final_stage_label, group_buckets, has_final_stage, next_match, partition,
    seed_filter, visible_matches, Bucket, FilterKey, GroupKey, ViewMode,
};
pub use stage::{classify, StageLabel};
pub use view::{
    fetch_league_data, Capabilities, FinalModePolicy, LeagueData, LeagueView, LoadOutcome,
    LoadPhase, LoadTicket, MatchRow, RenderedView,
};
