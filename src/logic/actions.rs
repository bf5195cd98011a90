//! Admin mutation controller: precondition checks and executors for every state-changing action.
//!
//! Each action is split into a pure `check_*` (no I/O; builds the request when allowed) and an
//! executor that issues the request and refreshes exactly the state the action changes.
//! Failures land on the action's own surface: bracket error, dialog error, blocking alert,
//! or the match's inline score error.

use crate::gateway::{BracketRequest, FinalStageRequest, GatewayError, LeagueApi, MatchUpdate};
use crate::logic::drafts::{EditDraft, ScoreDraft};
use crate::logic::view::{LeagueData, LeagueView, LoadPhase};
use crate::models::{
    count_in_range, FinalStageMode, League, LeagueMatch, Member, NewLeague, MIN_COUNT,
};
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Reasons an action was refused locally, or the gateway failure that ended it.
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Sign in as a club member first")]
    MissingIdentity,
    #[error("Only admins can do this")]
    NotAdmin,
    #[error("League is not loaded")]
    NotLoaded,
    #[error("Preliminary bracket has already been generated")]
    BracketAlreadyGenerated,
    #[error("Preliminary stage is not complete ({completed} of {total} matches played)")]
    PreliminaryIncomplete { completed: u32, total: u32 },
    #[error("Preliminary status is unknown")]
    PreliminaryStatusUnknown,
    #[error("Final stage has already been generated")]
    FinalStageExists,
    #[error("Groups and courts must be between 1 and 16")]
    InvalidGenerationInput,
    #[error("Ranked play needs 1, 2 or 4 matches (got {0})")]
    InvalidRankedMatchCount(u32),
    #[error("Match not found")]
    MatchNotFound(String),
    #[error("Match is not being edited")]
    NoEditInProgress(String),
    #[error("Court is required")]
    EmptyCourt,
    #[error("Enter valid scores")]
    InvalidScore,
    #[error("Only the applicant or an admin can cancel this application")]
    NotApplicant,
    #[error("Applications are closed once the bracket is generated")]
    ApplicationsClosed,
    #[error("Already applied to this league")]
    AlreadyApplied,
    #[error("{0}")]
    InvalidLeague(String),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ActionError {
    /// True when the refusal happened before any request was sent.
    pub fn is_local(&self) -> bool {
        !matches!(self, ActionError::Gateway(_))
    }
}

/// Group/court counts the admin wants for generation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct GenerationInputs {
    pub groups_count: u32,
    pub courts_count: u32,
}

impl Default for GenerationInputs {
    fn default() -> Self {
        Self {
            groups_count: MIN_COUNT,
            courts_count: MIN_COUNT,
        }
    }
}

/// Number of ranked-play matches per entrant.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum RankedMatchCount {
    One,
    Two,
    #[default]
    Four,
}

impl RankedMatchCount {
    pub fn get(self) -> u32 {
        match self {
            RankedMatchCount::One => 1,
            RankedMatchCount::Two => 2,
            RankedMatchCount::Four => 4,
        }
    }
}

impl TryFrom<u32> for RankedMatchCount {
    type Error = ActionError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            1 => Ok(RankedMatchCount::One),
            2 => Ok(RankedMatchCount::Two),
            4 => Ok(RankedMatchCount::Four),
            other => Err(ActionError::InvalidRankedMatchCount(other)),
        }
    }
}

impl Serialize for RankedMatchCount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.get())
    }
}

/// Final-stage selection dialog.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FinalStageDialog {
    pub open: bool,
    pub mode: FinalStageMode,
    pub ranked_matches: RankedMatchCount,
    pub submitting: bool,
    pub error: Option<String>,
}

/// Privileged actions need a known admin identity before any request goes out.
pub fn require_admin(actor: Option<&Member>) -> Result<&Member, ActionError> {
    let member = actor.ok_or(ActionError::MissingIdentity)?;
    if !member.is_admin() {
        return Err(ActionError::NotAdmin);
    }
    Ok(member)
}

/// Validate and create a league.
pub async fn create_league<G: LeagueApi>(
    api: &G,
    actor: Option<&Member>,
    payload: &NewLeague,
) -> Result<League, ActionError> {
    require_admin(actor)?;
    payload.validate().map_err(ActionError::InvalidLeague)?;
    let league = api.create_league(payload).await?;
    log::info!("created league {} ({})", league.id, league.name);
    Ok(league)
}

impl LeagueView {
    fn loaded_data(&self) -> Result<&LeagueData, ActionError> {
        match (self.phase(), self.data()) {
            (LoadPhase::Loaded, Some(data)) => Ok(data),
            _ => Err(ActionError::NotLoaded),
        }
    }

    fn find_match(&self, match_id: &str) -> Result<&LeagueMatch, ActionError> {
        self.matches()
            .iter()
            .find(|m| m.id == match_id)
            .ok_or_else(|| ActionError::MatchNotFound(match_id.to_string()))
    }

    /// Can the preliminary bracket be generated now? Builds the request if so.
    pub fn check_generate_bracket(
        &self,
        actor: Option<&Member>,
    ) -> Result<BracketRequest, ActionError> {
        let admin = require_admin(actor)?;
        let data = self.loaded_data()?;
        if data.league.bracket_generated() {
            return Err(ActionError::BracketAlreadyGenerated);
        }
        let inputs = self.inputs();
        if !count_in_range(inputs.groups_count) || !count_in_range(inputs.courts_count) {
            return Err(ActionError::InvalidGenerationInput);
        }
        Ok(BracketRequest {
            admin_id: admin.id.clone(),
            groups_count: inputs.groups_count,
            courts_count: inputs.courts_count,
        })
    }

    /// Generate the preliminary bracket, then reload the league for its generation timestamp.
    pub async fn generate_bracket<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
    ) -> Result<(), ActionError> {
        self.bracket_error = None;
        let result = self.run_generate_bracket(api, actor).await;
        if let Err(e) = &result {
            log::warn!("bracket generation refused or failed: {e}");
            self.bracket_error = Some(e.to_string());
        }
        result
    }

    async fn run_generate_bracket<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
    ) -> Result<(), ActionError> {
        let request = self.check_generate_bracket(actor)?;
        let league_id = self.loaded_data()?.league.id.clone();
        log::info!(
            "generating bracket for league {league_id}: {} groups, {} courts",
            request.groups_count,
            request.courts_count
        );
        let matches = api.generate_bracket(&league_id, &request).await?;
        let league = api.league(&league_id).await?;
        self.replace_matches(matches);
        self.replace_league(league);
        Ok(())
    }

    pub fn open_final_stage_dialog(&mut self) {
        self.dialog.open = true;
        self.dialog.error = None;
    }

    pub fn close_final_stage_dialog(&mut self) {
        self.dialog.open = false;
        self.dialog.submitting = false;
        self.dialog.error = None;
    }

    /// Pick the final-stage mode. `ranked_matches` is only read for ranked play.
    pub fn configure_final_stage(
        &mut self,
        mode: FinalStageMode,
        ranked_matches: Option<u32>,
    ) -> Result<(), ActionError> {
        if let (FinalStageMode::RankedPlay, Some(n)) = (mode, ranked_matches) {
            self.dialog.ranked_matches = RankedMatchCount::try_from(n)?;
        }
        self.dialog.mode = mode;
        Ok(())
    }

    /// Can the final stage be generated now? Builds the request if so.
    pub fn check_generate_final_stage(
        &self,
        actor: Option<&Member>,
    ) -> Result<FinalStageRequest, ActionError> {
        let admin = require_admin(actor)?;
        let data = self.loaded_data()?;
        if self.has_final_stage() {
            return Err(ActionError::FinalStageExists);
        }
        let status = data.preliminary.ok_or(ActionError::PreliminaryStatusUnknown)?;
        if !status.is_complete {
            return Err(ActionError::PreliminaryIncomplete {
                completed: status.completed_matches,
                total: status.total_matches,
            });
        }
        let courts_count = self.inputs().courts_count;
        if !count_in_range(courts_count) {
            return Err(ActionError::InvalidGenerationInput);
        }
        let num_matches = match self.dialog.mode {
            FinalStageMode::RankedPlay => Some(self.dialog.ranked_matches.get()),
            FinalStageMode::Elimination => None,
        };
        Ok(FinalStageRequest {
            admin_id: admin.id.clone(),
            mode: self.dialog.mode,
            num_matches,
            courts_count,
        })
    }

    /// Generate the final stage; on success reload league, matches and status and close the dialog.
    /// On failure the error stays in the open dialog.
    pub async fn generate_final_stage<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
    ) -> Result<(), ActionError> {
        self.dialog.error = None;
        self.dialog.submitting = true;
        let result = self.run_generate_final_stage(api, actor).await;
        self.dialog.submitting = false;
        match &result {
            Ok(()) => self.close_final_stage_dialog(),
            Err(e) => {
                log::warn!("final stage generation refused or failed: {e}");
                self.dialog.error = Some(e.to_string());
            }
        }
        result
    }

    async fn run_generate_final_stage<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
    ) -> Result<(), ActionError> {
        let request = self.check_generate_final_stage(actor)?;
        let league_id = self.loaded_data()?.league.id.clone();
        log::info!("generating {:?} final stage for league {league_id}", request.mode);
        api.generate_final_stage(&league_id, &request).await?;
        let (league, matches, status) = tokio::join!(
            api.league(&league_id),
            api.matches(&league_id),
            api.preliminary_status(&league_id),
        );
        let (league, matches) = (league?, matches?);
        self.replace_league(league);
        self.replace_matches(matches);
        self.replace_preliminary(status.ok());
        Ok(())
    }

    /// Enter edit mode for a match, seeding the draft from its current values.
    /// Several matches may be in edit mode at once.
    pub fn start_edit(&mut self, match_id: &str) -> Result<(), ActionError> {
        let draft = EditDraft::from_match(self.find_match(match_id)?);
        self.edits.insert(match_id.to_string(), draft);
        Ok(())
    }

    pub fn update_edit(
        &mut self,
        match_id: &str,
        scheduled_at: Option<DateTime<Utc>>,
        court: Option<String>,
    ) -> Result<(), ActionError> {
        let draft = self
            .edits
            .get_mut(match_id)
            .ok_or_else(|| ActionError::NoEditInProgress(match_id.to_string()))?;
        if let Some(at) = scheduled_at {
            draft.scheduled_at = at;
        }
        if let Some(court) = court {
            draft.court = court;
        }
        Ok(())
    }

    pub fn cancel_edit(&mut self, match_id: &str) {
        self.edits.remove(match_id);
    }

    /// Can this match's edit be saved now? Builds the request if so.
    pub fn check_save_edit(
        &self,
        actor: Option<&Member>,
        match_id: &str,
    ) -> Result<MatchUpdate, ActionError> {
        let admin = require_admin(actor)?;
        self.loaded_data()?;
        self.find_match(match_id)?;
        let draft = self
            .edits
            .get(match_id)
            .ok_or_else(|| ActionError::NoEditInProgress(match_id.to_string()))?;
        let court = draft.court().ok_or(ActionError::EmptyCourt)?;
        Ok(MatchUpdate {
            admin_id: admin.id.clone(),
            scheduled_at: Some(draft.scheduled_at),
            court: Some(court.to_string()),
        })
    }

    /// Save a match edit and reload matches. On failure the edit stays open and the alert is set.
    pub async fn save_edit<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
        match_id: &str,
    ) -> Result<(), ActionError> {
        let result = self.run_save_edit(api, actor, match_id).await;
        match &result {
            Ok(()) => {
                self.edits.remove(match_id);
            }
            Err(e) => {
                log::warn!("saving match {match_id} failed: {e}");
                self.alert = Some(e.to_string());
            }
        }
        result
    }

    async fn run_save_edit<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
        match_id: &str,
    ) -> Result<(), ActionError> {
        let update = self.check_save_edit(actor, match_id)?;
        let league_id = self.loaded_data()?.league.id.clone();
        api.update_match(match_id, &update).await?;
        let matches = api.matches(&league_id).await?;
        self.replace_matches(matches);
        Ok(())
    }

    /// Record what was typed into a match's score fields.
    pub fn set_score_draft(&mut self, match_id: &str, score_a: &str, score_b: &str) {
        let draft = self.scores.entry(match_id.to_string()).or_default();
        draft.score_a = score_a.to_string();
        draft.score_b = score_b.to_string();
        draft.error = None;
    }

    /// Validate and submit a match score, then reload matches and preliminary status.
    /// Invalid input never reaches the gateway. On failure the buffer is kept with an inline error.
    pub async fn submit_score<G: LeagueApi>(
        &mut self,
        api: &G,
        match_id: &str,
    ) -> Result<(), ActionError> {
        let league_id = self.loaded_data()?.league.id.clone();
        self.find_match(match_id)?;
        let draft = self.scores.entry(match_id.to_string()).or_default();
        let Some(score) = draft.parse() else {
            draft.error = Some(ActionError::InvalidScore.to_string());
            return Err(ActionError::InvalidScore);
        };
        draft.error = None;
        draft.submitting = true;

        log::info!(
            "submitting score {}-{} for match {match_id}",
            score.score_a,
            score.score_b
        );
        let result = async {
            api.update_score(match_id, &score).await?;
            let (matches, status) =
                tokio::join!(api.matches(&league_id), api.preliminary_status(&league_id));
            Ok::<_, GatewayError>((matches?, status.ok()))
        }
        .await;

        match result {
            Ok((matches, status)) => {
                self.scores.remove(match_id);
                self.replace_matches(matches);
                self.replace_preliminary(status);
                Ok(())
            }
            Err(e) => {
                log::warn!("score for match {match_id} failed: {e}");
                if let Some(draft) = self.scores.get_mut(match_id) {
                    draft.submitting = false;
                    draft.error = Some(e.to_string());
                }
                Err(e.into())
            }
        }
    }

    /// Can `actor` cancel `member_id`'s application now?
    pub fn check_cancel_application(
        &self,
        actor: Option<&Member>,
        member_id: &str,
    ) -> Result<(), ActionError> {
        let actor = actor.ok_or(ActionError::MissingIdentity)?;
        if actor.id != member_id && !actor.is_admin() {
            return Err(ActionError::NotApplicant);
        }
        if self.loaded_data()?.league.bracket_generated() {
            return Err(ActionError::ApplicationsClosed);
        }
        Ok(())
    }

    /// Cancel an application and reload the application list. Failures go to the alert.
    pub async fn cancel_application<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
        member_id: &str,
    ) -> Result<(), ActionError> {
        let result = async {
            self.check_cancel_application(actor, member_id)?;
            let league_id = self.loaded_data()?.league.id.clone();
            api.cancel_application(&league_id, member_id).await?;
            let applications = api.applications(&league_id).await?;
            self.replace_applications(applications);
            Ok::<_, ActionError>(())
        }
        .await;
        if let Err(e) = &result {
            log::warn!("cancelling application of {member_id} failed: {e}");
            self.alert = Some(e.to_string());
        }
        result
    }

    /// Can `actor` apply to this league now?
    pub fn check_apply(&self, actor: Option<&Member>) -> Result<(), ActionError> {
        let actor = actor.ok_or(ActionError::MissingIdentity)?;
        let data = self.loaded_data()?;
        if data.league.bracket_generated() {
            return Err(ActionError::ApplicationsClosed);
        }
        if data
            .applications
            .iter()
            .any(|a| a.member_id() == Some(actor.id.as_str()))
        {
            return Err(ActionError::AlreadyApplied);
        }
        Ok(())
    }

    /// Apply as `actor` and reload the application list. Failures go to the alert.
    pub async fn apply<G: LeagueApi>(
        &mut self,
        api: &G,
        actor: Option<&Member>,
    ) -> Result<(), ActionError> {
        let result = async {
            self.check_apply(actor)?;
            let member_id = actor.map(|m| m.id.clone()).ok_or(ActionError::MissingIdentity)?;
            let league_id = self.loaded_data()?.league.id.clone();
            api.apply(&league_id, &member_id).await?;
            let applications = api.applications(&league_id).await?;
            self.replace_applications(applications);
            Ok::<_, ActionError>(())
        }
        .await;
        if let Err(e) = &result {
            log::warn!("application failed: {e}");
            self.alert = Some(e.to_string());
        }
        result
    }
}
