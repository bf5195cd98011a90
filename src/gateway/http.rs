//! reqwest-backed gateway over HTTP + JSON.

use super::{
    BracketRequest, FinalStageRequest, GatewayError, LeagueApi, MatchUpdate, ScoreUpdate,
};
use crate::models::{
    Application, League, LeagueMatch, Member, NewLeague, NewMember, PlayerRanking,
    PreliminaryStatus,
};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send and return the body bytes of a success response.
    async fn send(&self, request: RequestBuilder) -> Result<Vec<u8>, GatewayError> {
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            // An unreadable error body still yields the generic status message.
            let body = response.bytes().await.unwrap_or_default();
            let err = GatewayError::from_status(status.as_u16(), &body);
            log::warn!("league service returned {}: {}", status.as_u16(), err);
            return Err(err);
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let body = self.send(request).await?;
        serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        self.fetch(self.client.get(self.url(path))).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.fetch(self.client.post(self.url(path)).json(body)).await
    }

    async fn patch<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        self.fetch(self.client.patch(self.url(path)).json(body)).await
    }
}

impl LeagueApi for HttpGateway {
    async fn list_leagues(&self) -> Result<Vec<League>, GatewayError> {
        self.get("/leagues").await
    }

    async fn league(&self, league_id: &str) -> Result<League, GatewayError> {
        self.get(&format!("/leagues/{league_id}")).await
    }

    async fn create_league(&self, payload: &NewLeague) -> Result<League, GatewayError> {
        self.post("/leagues", payload).await
    }

    async fn apply(&self, league_id: &str, member_id: &str) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "member_id": member_id });
        let request = self
            .client
            .post(self.url(&format!("/leagues/{league_id}/applications")))
            .json(&body);
        self.send(request).await.map(|_| ())
    }

    async fn applications(&self, league_id: &str) -> Result<Vec<Application>, GatewayError> {
        self.get(&format!("/leagues/{league_id}/applications")).await
    }

    async fn cancel_application(
        &self,
        league_id: &str,
        member_id: &str,
    ) -> Result<(), GatewayError> {
        let request = self
            .client
            .delete(self.url(&format!("/leagues/{league_id}/applications/{member_id}")));
        self.send(request).await.map(|_| ())
    }

    async fn matches(&self, league_id: &str) -> Result<Vec<LeagueMatch>, GatewayError> {
        self.get(&format!("/leagues/{league_id}/matches")).await
    }

    async fn generate_bracket(
        &self,
        league_id: &str,
        request: &BracketRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError> {
        self.post(&format!("/leagues/{league_id}/bracket"), request).await
    }

    async fn preliminary_status(&self, league_id: &str) -> Result<PreliminaryStatus, GatewayError> {
        self.get(&format!("/leagues/{league_id}/preliminary/status")).await
    }

    async fn generate_final_stage(
        &self,
        league_id: &str,
        request: &FinalStageRequest,
    ) -> Result<Vec<LeagueMatch>, GatewayError> {
        self.post(&format!("/leagues/{league_id}/doubles-tournament"), request)
            .await
    }

    async fn update_match(
        &self,
        match_id: &str,
        update: &MatchUpdate,
    ) -> Result<LeagueMatch, GatewayError> {
        self.patch(&format!("/matches/{match_id}"), update).await
    }

    async fn update_score(
        &self,
        match_id: &str,
        score: &ScoreUpdate,
    ) -> Result<LeagueMatch, GatewayError> {
        self.patch(&format!("/matches/{match_id}/score"), score).await
    }

    async fn rankings(
        &self,
        league_id: &str,
        group_number: Option<u32>,
    ) -> Result<Vec<PlayerRanking>, GatewayError> {
        let path = match group_number {
            Some(n) => format!("/leagues/{league_id}/rankings?group_number={n}"),
            None => format!("/leagues/{league_id}/rankings"),
        };
        self.get(&path).await
    }

    async fn create_member(&self, payload: &NewMember) -> Result<Member, GatewayError> {
        self.post("/members", payload).await
    }
}
