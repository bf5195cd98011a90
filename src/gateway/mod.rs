//! Resource gateway: typed request/response calls to the league service. No business logic.

mod http;

pub use http::HttpGateway;

use crate::models::{
    Application, FinalStageMode, League, LeagueMatch, Member, NewLeague, NewMember, PlayerRanking,
    PreliminaryStatus,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

/// Failure of a single gateway call. `Display` is the user-facing message.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    /// Non-success response; `message` is the server's detail or a generic fallback.
    #[error("{message}")]
    Status { status: u16, message: String },
    #[error("unexpected response from league service: {0}")]
    Decode(String),
}

/// Coarse class of a gateway failure, for callers that retry differently.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    Network,
    /// 4xx: the service refused the request as sent.
    Rejected,
    /// 5xx or any other non-success status.
    Server,
    Decode,
}

impl GatewayError {
    /// Build a status error from a response body, preferring the server's `detail` string.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        let detail = serde_json::from_slice::<serde_json::Value>(body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned));
        GatewayError::Status {
            status,
            message: detail.unwrap_or_else(|| format!("request failed with status {status}")),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            GatewayError::Network(_) => ErrorKind::Network,
            GatewayError::Status { status, .. } if (400..500).contains(status) => {
                ErrorKind::Rejected
            }
            GatewayError::Status { .. } => ErrorKind::Server,
            GatewayError::Decode(_) => ErrorKind::Decode,
        }
    }
}

/// Body of `POST /leagues/{id}/bracket`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct BracketRequest {
    pub admin_id: String,
    pub groups_count: u32,
    pub courts_count: u32,
}

/// Body of `POST /leagues/{id}/doubles-tournament`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FinalStageRequest {
    pub admin_id: String,
    pub mode: FinalStageMode,
    /// Ranked play only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_matches: Option<u32>,
    pub courts_count: u32,
}

/// Body of `PATCH /matches/{id}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchUpdate {
    pub admin_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub court: Option<String>,
}

/// Body of `PATCH /matches/{id}/score`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ScoreUpdate {
    pub score_a: u64,
    pub score_b: u64,
}

/// The league service as seen by the view engine.
#[allow(async_fn_in_trait)]
pub trait LeagueApi {
    async fn list_leagues(&self) -> Result<Vec<League>, GatewayError>;
    async fn league(&self, league_id: &str) -> Result<League, GatewayError>;
    async fn create_league(&self, payload: &NewLeague) -> Result<League, GatewayError>;
    async fn apply(&self, league_id: &str, member_id: &str) -> Result<(), GatewayError>;
    async fn applications(&self, league_id: &str) -> Result<Vec<Application>, GatewayError>;
    async fn cancel_application(
        &self,
        league_id: &str,
        member_id: &str,
    ) -> Result<(), GatewayError>;
    async fn matches(&self, league_id: &str) -> Result<Vec<LeagueMatch>, GatewayError>;
    async fn generate_bracket(
        &self,
        league_id: &str,
        request: &BracketRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError>;
    async fn preliminary_status(&self, league_id: &str) -> Result<PreliminaryStatus, GatewayError>;
    async fn generate_final_stage(
        &self,
        league_id: &str,
        request: &FinalStageRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError>;
    async fn update_match(
        &self,
        match_id: &str,
        update: &MatchUpdate,
    ) -> Result<LeagueMatch, GatewayError>;
    async fn update_score(
        &self,
        match_id: &str,
        score: &ScoreUpdate,
    ) -> Result<LeagueMatch, GatewayError>;
    async fn rankings(
        &self,
        league_id: &str,
        group_number: Option<u32>,
    ) -> Result<Vec<PlayerRanking>, GatewayError>;
    async fn create_member(&self, payload: &NewMember) -> Result<Member, GatewayError>;
}
