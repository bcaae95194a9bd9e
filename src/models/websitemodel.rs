use chrono::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const MIN_DOMAIN_AUTHORITY: i32 = 1;
pub const MAX_DOMAIN_AUTHORITY: i32 = 100;

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Website {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub domain: String,
    pub domain_authority: i32,
    pub category: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// A site as shown to other users in the marketplace, joined with its
/// owner's live balance.
#[derive(Debug, Serialize, sqlx::FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct MarketplaceListing {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub owner_points: i64,
    pub domain: String,
    pub domain_authority: i32,
    pub category: String,
    pub description: String,
}
