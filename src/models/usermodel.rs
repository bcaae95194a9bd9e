use chrono::prelude::*;
use serde::{Deserialize, Serialize};

/// Points every new account starts with.
pub const STARTING_POINTS: i64 = 100;

/// Balance an owner needs for their sites to be listed to other users.
pub const MIN_VISIBLE_POINTS: i64 = 1;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub avatar: Option<String>,

    /// Trading power. May go negative after a settled exchange.
    pub points: i64,

    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_listed(&self) -> bool {
        self.points >= MIN_VISIBLE_POINTS
    }
}
