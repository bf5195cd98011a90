//! In-memory league service for engine tests. Records every call by operation name.

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tennis_league_web::{
    ApplicantSnapshot, Application, BracketRequest, FinalStageMode, FinalStageRequest,
    GatewayError, League, LeagueApi, LeagueMatch, Level, MatchStatus, MatchUpdate, Member,
    NewLeague, NewMember, NextSlot, PlayerRanking, PreliminaryStatus, Role, ScoreUpdate, Stage,
};

pub fn at(hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 3, 9, 0, 0).unwrap() + Duration::hours(hours)
}

pub fn league(id: &str) -> League {
    League {
        id: id.to_string(),
        name: format!("League {id}"),
        surface_type: "hard".to_string(),
        entry_fee: 20000,
        max_participants: 16,
        auto_generate_bracket: false,
        groups_count: None,
        courts_count: None,
        bracket_generated_at: None,
        final_stage_mode: None,
        created_at: None,
    }
}

pub fn member(id: &str, role: Role) -> Member {
    Member {
        id: id.to_string(),
        full_name: format!("Member {id}"),
        email: format!("{id}@club.test"),
        level: Level::Intermediate,
        role,
        joined_at: None,
    }
}

pub fn admin() -> Member {
    member("admin-1", Role::Admin)
}

pub fn application(member_id: &str) -> Application {
    Application {
        id: format!("app-{member_id}"),
        status: "pending".to_string(),
        applied_at: None,
        member: Some(ApplicantSnapshot {
            id: member_id.to_string(),
            full_name: format!("Member {member_id}"),
            email: format!("{member_id}@club.test"),
            level: "intermediate".to_string(),
        }),
    }
}

pub fn game(
    id: &str,
    league_id: &str,
    stage: Stage,
    round: u32,
    group: u32,
    hours: i64,
) -> LeagueMatch {
    LeagueMatch {
        id: id.to_string(),
        league_id: league_id.to_string(),
        round,
        group_number: group,
        stage,
        player_a: format!("{id}-a"),
        player_b: format!("{id}-b"),
        court: "1".to_string(),
        scheduled_at: at(hours),
        status: MatchStatus::Scheduled,
        score_a: None,
        score_b: None,
        winner: None,
        completed_at: None,
        next_match_id: None,
        next_match_slot: None,
    }
}

pub fn prelim(id: &str, group: u32, hours: i64) -> LeagueMatch {
    game(id, "L1", Stage::Preliminary, 1, group, hours)
}

#[derive(Default)]
pub struct FakeState {
    pub leagues: HashMap<String, League>,
    pub applications: HashMap<String, Vec<Application>>,
    pub matches: Vec<LeagueMatch>,
    /// Replaces the computed preliminary status when set.
    pub status_override: Option<PreliminaryStatus>,
    /// Operation name -> (status, detail) to fail with.
    pub failures: HashMap<&'static str, (u16, String)>,
    pub calls: Vec<&'static str>,
    pub score_requests: Vec<(String, ScoreUpdate)>,
    pub final_stage_requests: Vec<FinalStageRequest>,
    next_id: u32,
}

#[derive(Default)]
pub struct FakeLeagueService {
    pub state: Mutex<FakeState>,
}

impl FakeLeagueService {
    pub fn with_league(league: League) -> Self {
        let fake = Self::default();
        fake.state.lock().unwrap().leagues.insert(league.id.clone(), league);
        fake
    }

    pub fn add_league(&self, league: League) {
        self.state.lock().unwrap().leagues.insert(league.id.clone(), league);
    }

    pub fn set_matches(&self, matches: Vec<LeagueMatch>) {
        self.state.lock().unwrap().matches = matches;
    }

    pub fn set_applications(&self, league_id: &str, applications: Vec<Application>) {
        self.state
            .lock()
            .unwrap()
            .applications
            .insert(league_id.to_string(), applications);
    }

    pub fn fail(&self, op: &'static str, status: u16, detail: &str) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(op, (status, detail.to_string()));
    }

    pub fn heal(&self, op: &'static str) {
        self.state.lock().unwrap().failures.remove(op);
    }

    pub fn override_status(&self, status: PreliminaryStatus) {
        self.state.lock().unwrap().status_override = Some(status);
    }

    pub fn calls_to(&self, op: &str) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| **c == op).count()
    }

    pub fn total_calls(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn update_league(&self, id: &str, f: impl FnOnce(&mut League)) {
        let mut s = self.state.lock().unwrap();
        f(s.leagues.get_mut(id).unwrap());
    }

    fn begin(
        &self,
        op: &'static str,
    ) -> Result<std::sync::MutexGuard<'_, FakeState>, GatewayError> {
        let mut s = self.state.lock().unwrap();
        s.calls.push(op);
        if let Some((status, detail)) = s.failures.get(op) {
            return Err(GatewayError::Status {
                status: *status,
                message: detail.clone(),
            });
        }
        Ok(s)
    }
}

fn not_found(what: &str) -> GatewayError {
    GatewayError::Status {
        status: 404,
        message: format!("{what} not found"),
    }
}

fn bad_request(detail: &str) -> GatewayError {
    GatewayError::Status {
        status: 400,
        message: detail.to_string(),
    }
}

impl FakeState {
    fn fresh_id(&mut self) -> String {
        self.next_id += 1;
        format!("gen{}", self.next_id)
    }

    fn league_matches(&self, league_id: &str) -> Vec<LeagueMatch> {
        self.matches
            .iter()
            .filter(|m| m.league_id == league_id)
            .cloned()
            .collect()
    }
}

impl LeagueApi for FakeLeagueService {
    async fn list_leagues(&self) -> Result<Vec<League>, GatewayError> {
        let s = self.begin("list_leagues")?;
        Ok(s.leagues.values().cloned().collect())
    }

    async fn league(&self, league_id: &str) -> Result<League, GatewayError> {
        let s = self.begin("league")?;
        s.leagues.get(league_id).cloned().ok_or_else(|| not_found("League"))
    }

    async fn create_league(&self, payload: &NewLeague) -> Result<League, GatewayError> {
        let mut s = self.begin("create_league")?;
        let id = s.fresh_id();
        let mut created = league(&id);
        created.name = payload.name.clone();
        created.groups_count = payload.groups_count;
        created.courts_count = payload.courts_count;
        s.leagues.insert(id, created.clone());
        Ok(created)
    }

    async fn apply(&self, league_id: &str, member_id: &str) -> Result<(), GatewayError> {
        let mut s = self.begin("apply")?;
        s.applications
            .entry(league_id.to_string())
            .or_default()
            .push(application(member_id));
        Ok(())
    }

    async fn applications(&self, league_id: &str) -> Result<Vec<Application>, GatewayError> {
        let s = self.begin("applications")?;
        Ok(s.applications.get(league_id).cloned().unwrap_or_default())
    }

    async fn cancel_application(
        &self,
        league_id: &str,
        member_id: &str,
    ) -> Result<(), GatewayError> {
        let mut s = self.begin("cancel_application")?;
        let list = s.applications.entry(league_id.to_string()).or_default();
        let before = list.len();
        list.retain(|a| a.member_id() != Some(member_id));
        if list.len() == before {
            return Err(not_found("Application"));
        }
        Ok(())
    }

    async fn matches(&self, league_id: &str) -> Result<Vec<LeagueMatch>, GatewayError> {
        let s = self.begin("matches")?;
        Ok(s.league_matches(league_id))
    }

    async fn generate_bracket(
        &self,
        league_id: &str,
        request: &BracketRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError> {
        let mut s = self.begin("generate_bracket")?;
        let generated = s
            .leagues
            .get(league_id)
            .ok_or_else(|| not_found("League"))?
            .bracket_generated();
        if generated {
            return Err(bad_request("Bracket already generated"));
        }
        let mut created = Vec::new();
        for group in 1..=request.groups_count {
            for slot in 0..3 {
                let id = s.fresh_id();
                let mut m = game(
                    &id,
                    league_id,
                    Stage::Preliminary,
                    1,
                    group,
                    i64::from(group * 10 + slot),
                );
                m.court = ((slot % request.courts_count) + 1).to_string();
                created.push(m);
            }
        }
        s.matches.retain(|m| m.league_id != league_id);
        s.matches.extend(created.iter().cloned());
        if let Some(l) = s.leagues.get_mut(league_id) {
            l.bracket_generated_at = Some(at(0));
            l.groups_count = Some(request.groups_count);
            l.courts_count = Some(request.courts_count);
        }
        Ok(created)
    }

    async fn preliminary_status(&self, league_id: &str) -> Result<PreliminaryStatus, GatewayError> {
        let s = self.begin("preliminary_status")?;
        if let Some(status) = s.status_override {
            return Ok(status);
        }
        let prelim: Vec<_> = s
            .league_matches(league_id)
            .into_iter()
            .filter(|m| m.stage == Stage::Preliminary)
            .collect();
        let total = prelim.len() as u32;
        let completed = prelim.iter().filter(|m| m.is_completed()).count() as u32;
        Ok(PreliminaryStatus {
            is_complete: total > 0 && completed == total,
            total_matches: total,
            completed_matches: completed,
        })
    }

    async fn generate_final_stage(
        &self,
        league_id: &str,
        request: &FinalStageRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError> {
        let mut s = self.begin("generate_final_stage")?;
        s.final_stage_requests.push(request.clone());
        let mut created = Vec::new();
        match request.mode {
            FinalStageMode::RankedPlay => {
                for i in 0..request.num_matches.unwrap_or(1) {
                    let id = s.fresh_id();
                    created.push(game(&id, league_id, Stage::Ranked, 1, 0, 100 + i64::from(i)));
                }
            }
            FinalStageMode::Elimination => {
                let final_id = s.fresh_id();
                for (i, slot) in [NextSlot::TeamA, NextSlot::TeamB].into_iter().enumerate() {
                    let id = s.fresh_id();
                    let mut semi = game(&id, league_id, Stage::Elimination, 3, 0, 100 + i as i64);
                    semi.next_match_id = Some(final_id.clone());
                    semi.next_match_slot = Some(slot);
                    created.push(semi);
                }
                created.push(game(&final_id, league_id, Stage::Elimination, 4, 0, 110));
            }
        }
        s.matches.extend(created.iter().cloned());
        if let Some(l) = s.leagues.get_mut(league_id) {
            l.final_stage_mode = Some(request.mode);
        }
        Ok(created)
    }

    async fn update_match(
        &self,
        match_id: &str,
        update: &MatchUpdate,
    ) -> Result<LeagueMatch, GatewayError> {
        let mut s = self.begin("update_match")?;
        let m = s
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| not_found("Match"))?;
        if let Some(at) = update.scheduled_at {
            m.scheduled_at = at;
        }
        if let Some(court) = &update.court {
            m.court = court.clone();
        }
        Ok(m.clone())
    }

    async fn update_score(
        &self,
        match_id: &str,
        score: &ScoreUpdate,
    ) -> Result<LeagueMatch, GatewayError> {
        let mut s = self.begin("update_score")?;
        s.score_requests.push((match_id.to_string(), *score));
        let m = s
            .matches
            .iter_mut()
            .find(|m| m.id == match_id)
            .ok_or_else(|| not_found("Match"))?;
        if m.is_completed() {
            return Err(bad_request("Match already completed"));
        }
        m.score_a = Some(score.score_a);
        m.score_b = Some(score.score_b);
        m.status = MatchStatus::Completed;
        m.completed_at = Some(at(50));
        m.winner = match score.score_a.cmp(&score.score_b) {
            std::cmp::Ordering::Greater => Some(m.player_a.clone()),
            std::cmp::Ordering::Less => Some(m.player_b.clone()),
            std::cmp::Ordering::Equal => None,
        };
        Ok(m.clone())
    }

    async fn rankings(
        &self,
        _league_id: &str,
        _group_number: Option<u32>,
    ) -> Result<Vec<PlayerRanking>, GatewayError> {
        self.begin("rankings")?;
        Ok(Vec::new())
    }

    async fn create_member(&self, payload: &NewMember) -> Result<Member, GatewayError> {
        let mut s = self.begin("create_member")?;
        let id = s.fresh_id();
        Ok(Member {
            id,
            full_name: payload.full_name.clone(),
            email: payload.email.clone(),
            level: payload.level,
            role: payload.role.unwrap_or_default(),
            joined_at: None,
        })
    }
}
