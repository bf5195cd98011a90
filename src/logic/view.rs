//! League view reconciler: loads league, applications, matches and preliminary status
//! as one snapshot, owns view mode / filter / generation inputs, and renders derived state.

use crate::gateway::LeagueApi;
use crate::logic::actions::{FinalStageDialog, GenerationInputs};
use crate::logic::drafts::{EditDraft, ScoreDraft};
use crate::logic::grouping::{self, Bucket, FilterKey, ViewMode};
use crate::logic::stage;
use crate::models::{
    Application, League, LeagueId, LeagueMatch, Member, MatchId, PreliminaryStatus,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Load state of the view.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Error,
}

/// When the view switches itself to the final stage.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalModePolicy {
    /// Once per session, on the reload that first brings final-stage matches.
    /// A later manual switch back to preliminary is kept.
    #[default]
    OnTransition,
    /// On every match reload that contains final-stage matches.
    Continuous,
}

/// Everything fetched for one league in one load cycle.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LeagueData {
    pub league: League,
    pub applications: Vec<Application>,
    pub matches: Vec<LeagueMatch>,
    /// None when the status request failed; shown as unknown.
    pub preliminary: Option<PreliminaryStatus>,
}

/// Identifies one load cycle. Results carrying an outdated ticket are discarded.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LoadTicket {
    league_id: LeagueId,
    generation: u64,
}

impl LoadTicket {
    pub fn league_id(&self) -> &str {
        &self.league_id
    }
}

/// Settled result of a load cycle, not yet applied to a view.
#[derive(Debug)]
pub struct LoadOutcome {
    ticket: LoadTicket,
    result: Result<LeagueData, String>,
}

impl LoadOutcome {
    pub fn ticket(&self) -> &LoadTicket {
        &self.ticket
    }
}

/// Issue the four loads concurrently and wait for all of them.
/// A failed preliminary status degrades to unknown; any other failure fails the cycle.
pub async fn fetch_league_data<G: LeagueApi>(api: &G, ticket: LoadTicket) -> LoadOutcome {
    let id = ticket.league_id.as_str();
    log::debug!("loading league {id}");
    let (league, applications, matches, preliminary) = tokio::join!(
        api.league(id),
        api.applications(id),
        api.matches(id),
        api.preliminary_status(id),
    );
    let preliminary = match preliminary {
        Ok(status) => Some(status),
        Err(e) => {
            log::warn!("preliminary status for league {id} unavailable: {e}");
            None
        }
    };
    let result = match (league, applications, matches) {
        (Ok(league), Ok(applications), Ok(matches)) => Ok(LeagueData {
            league,
            applications,
            matches,
            preliminary,
        }),
        (Err(e), _, _) | (_, Err(e), _) | (_, _, Err(e)) => {
            log::warn!("loading league {id} failed: {e}");
            Err(e.to_string())
        }
    };
    LoadOutcome { ticket, result }
}

/// One league view session.
#[derive(Clone, Debug, Default)]
pub struct LeagueView {
    league_id: Option<LeagueId>,
    generation: u64,
    phase: LoadPhase,
    load_error: Option<String>,
    data: Option<LeagueData>,
    policy: FinalModePolicy,
    mode: ViewMode,
    /// Final-stage matches have been seen in this session.
    saw_final_stage: bool,
    /// None until seeded from the first group, or set by the user.
    filter: Option<FilterKey>,
    pub(crate) inputs: GenerationInputs,
    pub(crate) inputs_edited: bool,
    pub(crate) bracket_error: Option<String>,
    pub(crate) dialog: FinalStageDialog,
    pub(crate) edits: HashMap<MatchId, EditDraft>,
    pub(crate) scores: HashMap<MatchId, ScoreDraft>,
    pub(crate) alert: Option<String>,
}

impl LeagueView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: FinalModePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn league_id(&self) -> Option<&str> {
        self.league_id.as_deref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn data(&self) -> Option<&LeagueData> {
        self.data.as_ref()
    }

    pub fn league(&self) -> Option<&League> {
        self.data.as_ref().map(|d| &d.league)
    }

    pub fn matches(&self) -> &[LeagueMatch] {
        self.data.as_ref().map(|d| d.matches.as_slice()).unwrap_or_default()
    }

    pub fn applications(&self) -> &[Application] {
        self.data
            .as_ref()
            .map(|d| d.applications.as_slice())
            .unwrap_or_default()
    }

    pub fn preliminary_status(&self) -> Option<PreliminaryStatus> {
        self.data.as_ref().and_then(|d| d.preliminary)
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn filter(&self) -> FilterKey {
        self.filter.unwrap_or_default()
    }

    pub fn inputs(&self) -> GenerationInputs {
        self.inputs
    }

    pub fn bracket_error(&self) -> Option<&str> {
        self.bracket_error.as_deref()
    }

    pub fn final_stage_dialog(&self) -> &FinalStageDialog {
        &self.dialog
    }

    pub fn edit_draft(&self, match_id: &str) -> Option<&EditDraft> {
        self.edits.get(match_id)
    }

    pub fn score_draft(&self, match_id: &str) -> Option<&ScoreDraft> {
        self.scores.get(match_id)
    }

    pub fn alert(&self) -> Option<&str> {
        self.alert.as_deref()
    }

    pub fn dismiss_alert(&mut self) {
        self.alert = None;
    }

    /// Start a load cycle. A different league id resets the session to a fresh view.
    pub fn begin_load(&mut self, league_id: impl Into<LeagueId>) -> LoadTicket {
        let league_id = league_id.into();
        if self.league_id.as_deref() != Some(league_id.as_str()) {
            *self = Self {
                generation: self.generation,
                policy: self.policy,
                inputs: self.inputs,
                ..Self::default()
            };
            self.league_id = Some(league_id.clone());
        }
        self.generation += 1;
        self.phase = LoadPhase::Loading;
        self.load_error = None;
        LoadTicket {
            league_id,
            generation: self.generation,
        }
    }

    /// Whether results for this ticket may still be applied.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        ticket.generation == self.generation
            && self.league_id.as_deref() == Some(ticket.league_id.as_str())
    }

    /// Apply a settled load. Returns false (and changes nothing) for a stale ticket.
    pub fn apply_load(&mut self, outcome: LoadOutcome) -> bool {
        if !self.is_current(&outcome.ticket) {
            log::debug!(
                "discarding stale load for league {}",
                outcome.ticket.league_id
            );
            return false;
        }
        match outcome.result {
            Ok(data) => {
                self.seed_inputs(&data.league);
                self.data = Some(data);
                self.phase = LoadPhase::Loaded;
                self.on_matches_changed();
                log::info!(
                    "league {} loaded ({} matches)",
                    outcome.ticket.league_id,
                    self.matches().len()
                );
            }
            Err(message) => {
                self.data = None;
                self.phase = LoadPhase::Error;
                self.load_error = Some(message);
            }
        }
        true
    }

    /// Begin, fetch and apply in one go.
    pub async fn load<G: LeagueApi>(&mut self, api: &G, league_id: impl Into<LeagueId>) -> bool {
        let ticket = self.begin_load(league_id);
        let outcome = fetch_league_data(api, ticket).await;
        self.apply_load(outcome)
    }

    /// Leave the view: in-flight loads become stale and state is dropped.
    pub fn leave(&mut self) {
        *self = Self {
            generation: self.generation + 1,
            policy: self.policy,
            ..Self::default()
        };
    }

    /// Manual tab switch. Always honored.
    pub fn set_mode(&mut self, mode: ViewMode) {
        self.mode = mode;
    }

    pub fn set_filter(&mut self, filter: FilterKey) {
        self.filter = Some(filter);
    }

    /// Admin-typed group/court counts for generation. Range is checked when generating.
    pub fn set_inputs(&mut self, groups_count: u32, courts_count: u32) {
        self.inputs = GenerationInputs {
            groups_count,
            courts_count,
        };
        self.inputs_edited = true;
    }

    /// Stored counts win unless the admin has typed their own in this session.
    fn seed_inputs(&mut self, league: &League) {
        if self.inputs_edited {
            return;
        }
        if let Some(groups) = league.groups_count {
            self.inputs.groups_count = groups;
        }
        if let Some(courts) = league.courts_count {
            self.inputs.courts_count = courts;
        }
    }

    pub(crate) fn replace_matches(&mut self, matches: Vec<LeagueMatch>) {
        if let Some(data) = self.data.as_mut() {
            data.matches = matches;
            self.on_matches_changed();
        }
    }

    pub(crate) fn replace_league(&mut self, league: League) {
        if let Some(data) = self.data.as_mut() {
            data.league = league;
        }
    }

    pub(crate) fn replace_applications(&mut self, applications: Vec<Application>) {
        if let Some(data) = self.data.as_mut() {
            data.applications = applications;
        }
    }

    pub(crate) fn replace_preliminary(&mut self, status: Option<PreliminaryStatus>) {
        if let Some(data) = self.data.as_mut() {
            data.preliminary = status;
        }
    }

    fn on_matches_changed(&mut self) {
        let has_final = self.has_final_stage();
        let force = match self.policy {
            FinalModePolicy::OnTransition => has_final && !self.saw_final_stage,
            FinalModePolicy::Continuous => has_final,
        };
        if force && self.mode == ViewMode::Preliminary {
            log::info!("final stage present, switching view to final");
            self.mode = ViewMode::Final;
        }
        self.saw_final_stage |= has_final;

        if self.matches().is_empty() {
            self.filter = None;
        } else {
            self.filter = grouping::seed_filter(self.filter, &self.group_buckets());
        }
    }

    pub fn has_final_stage(&self) -> bool {
        grouping::has_final_stage(self.matches())
    }

    pub fn preliminary_matches(&self) -> Vec<LeagueMatch> {
        grouping::partition(self.matches()).0
    }

    pub fn final_matches(&self) -> Vec<LeagueMatch> {
        grouping::partition(self.matches()).1
    }

    pub fn group_buckets(&self) -> Vec<Bucket> {
        grouping::group_buckets(&self.preliminary_matches())
    }

    pub fn final_bucket(&self) -> Option<Bucket> {
        let mode = self.league().and_then(|l| l.final_stage_mode);
        grouping::final_bucket(&self.final_matches(), mode)
    }

    pub fn visible_matches(&self) -> Vec<LeagueMatch> {
        let (preliminary, finals) = grouping::partition(self.matches());
        grouping::visible_matches(self.mode, self.filter(), &preliminary, &finals)
    }

    pub fn next_match(&self) -> Option<&LeagueMatch> {
        grouping::next_match(self.matches())
    }

    /// Serializable picture of the view for the given actor.
    /// Derived parts are empty unless the view is loaded.
    pub fn render(&self, actor: Option<&Member>) -> RenderedView {
        let loaded = self.phase == LoadPhase::Loaded;
        let buckets = match (loaded, self.mode) {
            (false, _) => Vec::new(),
            (true, ViewMode::Preliminary) => self.group_buckets(),
            (true, ViewMode::Final) => self.final_bucket().into_iter().collect(),
        };
        let capabilities = Capabilities {
            can_generate_bracket: loaded && self.check_generate_bracket(actor).is_ok(),
            can_generate_final_stage: loaded && self.check_generate_final_stage(actor).is_ok(),
            can_edit_matches: actor.is_some_and(Member::is_admin),
            can_cancel_applications: loaded
                && self.league().is_some_and(|l| !l.bracket_generated())
                && actor.is_some(),
        };
        RenderedView {
            league_id: self.league_id.clone(),
            phase: self.phase,
            error: self.load_error.clone(),
            league: self.league().cloned(),
            applications: self.applications().to_vec(),
            preliminary_status: self.preliminary_status(),
            view_mode: self.mode,
            filter: self.filter(),
            has_final_stage: loaded && self.has_final_stage(),
            buckets,
            matches: if loaded {
                self.visible_matches().into_iter().map(MatchRow::new).collect()
            } else {
                Vec::new()
            },
            next_match: self
                .next_match()
                .filter(|_| loaded)
                .cloned()
                .map(MatchRow::new),
            inputs: self.inputs,
            capabilities,
            bracket_error: self.bracket_error.clone(),
            final_stage_dialog: self.dialog.clone(),
            edits: self.edits.clone(),
            scores: self.scores.clone(),
            alert: self.alert.clone(),
        }
    }
}

/// A match with its stage label.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchRow {
    #[serde(flatten)]
    pub game: LeagueMatch,
    pub stage_label: String,
}

impl MatchRow {
    pub fn new(game: LeagueMatch) -> Self {
        let stage_label = stage::classify(&game).to_string();
        Self { game, stage_label }
    }
}

/// Which admin controls are usable right now.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Capabilities {
    pub can_generate_bracket: bool,
    pub can_generate_final_stage: bool,
    pub can_edit_matches: bool,
    pub can_cancel_applications: bool,
}

/// Output of [`LeagueView::render`].
#[derive(Clone, Debug, Serialize)]
pub struct RenderedView {
    pub league_id: Option<LeagueId>,
    pub phase: LoadPhase,
    pub error: Option<String>,
    pub league: Option<League>,
    pub applications: Vec<Application>,
    pub preliminary_status: Option<PreliminaryStatus>,
    pub view_mode: ViewMode,
    pub filter: FilterKey,
    pub has_final_stage: bool,
    pub buckets: Vec<Bucket>,
    pub matches: Vec<MatchRow>,
    pub next_match: Option<MatchRow>,
    pub inputs: GenerationInputs,
    pub capabilities: Capabilities,
    pub bracket_error: Option<String>,
    pub final_stage_dialog: FinalStageDialog,
    pub edits: HashMap<MatchId, EditDraft>,
    pub scores: HashMap<MatchId, ScoreDraft>,
    pub alert: Option<String>,
}
