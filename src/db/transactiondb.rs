// db/transactiondb.rs
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction as SqlTransaction};
use uuid::Uuid;

use super::db::DBClient;
use crate::models::transactionmodel::{Transaction, TransactionStatus};

#[async_trait]
pub trait TransactionExt {
    /// Credits the provider, debits the recipient and appends the
    /// transaction as `verified`, all inside one database transaction.
    /// `amount` is taken as given; the recipient balance has no floor.
    async fn settle_exchange(
        &self,
        provider_id: Uuid,
        recipient_id: Uuid,
        amount: i64,
        transaction: Transaction,
    ) -> Result<Transaction, sqlx::Error>;

    /// Appends a `failed` attempt. No balance moves.
    async fn record_failed_exchange(
        &self,
        transaction: Transaction,
        reason: &str,
    ) -> Result<Transaction, sqlx::Error>;

    /// Newest first.
    async fn get_transactions(&self) -> Result<Vec<Transaction>, sqlx::Error>;

    /// Transactions where `user_id` is provider or recipient, newest first.
    async fn get_user_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, sqlx::Error>;
}

async fn apply_points(
    tx: &mut SqlTransaction<'_, Sqlite>,
    user_id: Uuid,
    delta: i64,
) -> Result<(), sqlx::Error> {
    let result = sqlx::query("UPDATE users SET points = points + ? WHERE id = ?")
        .bind(delta)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    if result.rows_affected() != 1 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub(crate) async fn insert_transaction(
    tx: &mut SqlTransaction<'_, Sqlite>,
    transaction: &Transaction,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO transactions
        (id, source_website_id, target_website_id, provider_user_id, recipient_user_id,
         source_url, points_transferred, status, failure_reason, timestamp)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(transaction.id)
    .bind(transaction.source_website_id)
    .bind(transaction.target_website_id)
    .bind(transaction.provider_user_id)
    .bind(transaction.recipient_user_id)
    .bind(transaction.source_url.as_str())
    .bind(transaction.points_transferred)
    .bind(transaction.status)
    .bind(transaction.failure_reason.as_deref())
    .bind(transaction.timestamp)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

#[async_trait]
impl TransactionExt for DBClient {
    async fn settle_exchange(
        &self,
        provider_id: Uuid,
        recipient_id: Uuid,
        amount: i64,
        mut transaction: Transaction,
    ) -> Result<Transaction, sqlx::Error> {
        transaction.provider_user_id = provider_id;
        transaction.recipient_user_id = recipient_id;
        transaction.points_transferred = amount;
        transaction.status = TransactionStatus::Verified;
        transaction.failure_reason = None;

        let mut tx = self.pool.begin().await?;

        apply_points(&mut tx, provider_id, amount).await?;
        apply_points(&mut tx, recipient_id, -amount).await?;
        insert_transaction(&mut tx, &transaction).await?;

        tx.commit().await?;

        tracing::info!(
            transaction_id = %transaction.id,
            %provider_id,
            %recipient_id,
            amount,
            "exchange settled"
        );
        Ok(transaction)
    }

    async fn record_failed_exchange(
        &self,
        mut transaction: Transaction,
        reason: &str,
    ) -> Result<Transaction, sqlx::Error> {
        transaction.status = TransactionStatus::Failed;
        transaction.points_transferred = 0;
        transaction.failure_reason = Some(reason.to_string());

        let mut tx = self.pool.begin().await?;
        insert_transaction(&mut tx, &transaction).await?;
        tx.commit().await?;

        tracing::info!(transaction_id = %transaction.id, reason, "exchange attempt recorded as failed");
        Ok(transaction)
    }

    async fn get_transactions(&self) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, source_website_id, target_website_id, provider_user_id, recipient_user_id,
                   source_url, points_transferred, status, failure_reason, timestamp
            FROM transactions ORDER BY seq DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_user_transactions(&self, user_id: Uuid) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, source_website_id, target_website_id, provider_user_id, recipient_user_id,
                   source_url, points_transferred, status, failure_reason, timestamp
            FROM transactions
            WHERE provider_user_id = ?1 OR recipient_user_id = ?1
            ORDER BY seq DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
    }
}
