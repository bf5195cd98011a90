//! Club member identity and sign-up payload.

use crate::models::timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a member.
pub type MemberId = String;

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Member,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Beginner,
    Intermediate,
    Advanced,
}

/// A club member.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub full_name: String,
    pub email: String,
    pub level: Level,
    #[serde(default)]
    pub role: Role,
    #[serde(default, with = "timestamp::option")]
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Sign-up payload.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub full_name: String,
    pub email: String,
    pub level: Level,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
