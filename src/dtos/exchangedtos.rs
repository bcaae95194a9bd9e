use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::{transactionmodel::Transaction, usermodel::User};

use super::userdtos::FilterUserDto;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRequestDto {
    pub target_website_id: Uuid,

    /// Defaults to the requester's first registered site.
    pub source_website_id: Option<Uuid>,

    #[validate(length(min = 1, max = 2048, message = "Source URL must be between 1 and 2048 characters"))]
    pub source_url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeResultDto {
    pub transaction: Transaction,
    pub user: FilterUserDto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Earned,
    Spent,
}

/// A transaction as seen by one participant.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionHistoryDto {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub direction: Direction,
    pub signed_points: i64,
}

impl TransactionHistoryDto {
    pub fn for_user(transaction: Transaction, user: &User) -> Self {
        let direction = if transaction.provider_user_id == user.id {
            Direction::Earned
        } else {
            Direction::Spent
        };
        let signed_points = transaction.delta_for(user.id);

        TransactionHistoryDto {
            transaction,
            direction,
            signed_points,
        }
    }

    pub fn for_user_all(transactions: Vec<Transaction>, user: &User) -> Vec<Self> {
        transactions
            .into_iter()
            .map(|t| TransactionHistoryDto::for_user(t, user))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::transactionmodel::TransactionStatus;

    fn user(points: i64) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Someone".to_string(),
            email: "someone@example.com".to_string(),
            avatar: None,
            points,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn history_entries_are_signed_by_role() {
        let provider = user(100);
        let recipient = user(100);
        let mut tx = Transaction::pending(
            Uuid::new_v4(),
            Uuid::new_v4(),
            provider.id,
            recipient.id,
            "https://a.example/post".to_string(),
            35,
        );
        tx.status = TransactionStatus::Verified;

        let earned = TransactionHistoryDto::for_user(tx.clone(), &provider);
        assert_eq!(earned.direction, Direction::Earned);
        assert_eq!(earned.signed_points, 35);

        let spent = TransactionHistoryDto::for_user(tx, &recipient);
        assert_eq!(spent.direction, Direction::Spent);
        assert_eq!(spent.signed_points, -35);

        let json = serde_json::to_value(&spent).unwrap();
        assert_eq!(json["direction"], "spent");
        assert_eq!(json["signedPoints"], -35);
        assert_eq!(json["status"], "verified");
    }

    #[test]
    fn exchange_request_uses_camel_case() {
        let target = Uuid::new_v4();
        let body = serde_json::json!({ "targetWebsiteId": target });
        let dto: ExchangeRequestDto = serde_json::from_value(body).unwrap();
        assert_eq!(dto.target_website_id, target);
        assert!(dto.source_website_id.is_none());
        assert!(dto.validate().is_ok());

        let blank_url = ExchangeRequestDto {
            source_url: Some(String::new()),
            ..dto
        };
        assert!(blank_url.validate().is_err());
    }
}
