use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Verified,
    Failed,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: Uuid,
    /// Site the link is placed on.
    pub source_website_id: Uuid,
    /// Site the link points to.
    pub target_website_id: Uuid,
    pub provider_user_id: Uuid,
    pub recipient_user_id: Uuid,
    pub source_url: String,
    pub points_transferred: i64,
    pub status: TransactionStatus,

    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure_reason: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// An in-memory exchange awaiting verification. Only `settle_exchange`
    /// or `record_failed_exchange` ever persist it.
    pub fn pending(
        source_website_id: Uuid,
        target_website_id: Uuid,
        provider_user_id: Uuid,
        recipient_user_id: Uuid,
        source_url: String,
        points: i64,
    ) -> Self {
        Transaction {
            id: Uuid::new_v4(),
            source_website_id,
            target_website_id,
            provider_user_id,
            recipient_user_id,
            source_url,
            points_transferred: points,
            status: TransactionStatus::Pending,
            failure_reason: None,
            timestamp: Utc::now(),
        }
    }

    /// Point delta this transaction applied to `user_id`'s balance.
    pub fn delta_for(&self, user_id: Uuid) -> i64 {
        if self.status != TransactionStatus::Verified {
            return 0;
        }
        let mut delta = 0;
        if self.provider_user_id == user_id {
            delta += self.points_transferred;
        }
        if self.recipient_user_id == user_id {
            delta -= self.points_transferred;
        }
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verified_deltas_cancel_out() {
        let provider = Uuid::new_v4();
        let recipient = Uuid::new_v4();
        let mut tx = Transaction::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            provider,
            recipient,
            "https://a.example/post".to_string(),
            42,
        );
        assert_eq!(tx.delta_for(provider), 0);

        tx.status = TransactionStatus::Verified;
        assert_eq!(tx.delta_for(provider), 42);
        assert_eq!(tx.delta_for(recipient), -42);
        assert_eq!(tx.delta_for(provider) + tx.delta_for(recipient), 0);
        assert_eq!(tx.delta_for(Uuid::new_v4()), 0);
    }
}
