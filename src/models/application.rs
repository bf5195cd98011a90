//! League applications and the member snapshot they carry.

use crate::models::member::MemberId;
use crate::models::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Applicant details as captured on the application.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ApplicantSnapshot {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub level: String,
}

/// A member's application to a league.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: String,
    pub status: String,
    #[serde(default, with = "timestamp::option")]
    pub applied_at: Option<DateTime<Utc>>,
    /// None when the member record is gone.
    #[serde(default)]
    pub member: Option<ApplicantSnapshot>,
}

impl Application {
    pub fn member_id(&self) -> Option<&str> {
        self.member.as_ref().map(|m| m.id.as_str())
    }
}
