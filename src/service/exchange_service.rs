// service/exchange_service.rs
use std::sync::Arc;

use uuid::Uuid;

use crate::{
    db::{db::DBClient, transactiondb::TransactionExt, userdb::UserExt, websitedb::WebsiteExt},
    models::{transactionmodel::Transaction, usermodel::User, websitemodel::Website},
    service::{error::ServiceError, verification_service::BacklinkVerifier},
};

const DEFAULT_SOURCE_PATH: &str = "/blog/guest-post-feature";

/// A settled exchange and the provider's new balance.
#[derive(Debug, Clone)]
pub struct ExchangeReceipt {
    pub transaction: Transaction,
    pub provider: User,
}

#[derive(Clone)]
pub struct ExchangeService {
    db_client: Arc<DBClient>,
    verifier: Arc<dyn BacklinkVerifier>,
}

impl ExchangeService {
    pub fn new(db_client: Arc<DBClient>, verifier: Arc<dyn BacklinkVerifier>) -> Self {
        Self {
            db_client,
            verifier,
        }
    }

    /// `viewer` places a link on one of their sites pointing at
    /// `target_website_id` and earns the source site's authority in points,
    /// paid by the target's owner once the link is verified.
    pub async fn request_exchange(
        &self,
        viewer: &User,
        target_website_id: Uuid,
        source_website_id: Option<Uuid>,
        source_url: Option<&str>,
    ) -> Result<ExchangeReceipt, ServiceError> {
        let source = self.source_website(viewer, source_website_id).await?;

        let target = self
            .db_client
            .get_website(target_website_id)
            .await?
            .ok_or(ServiceError::WebsiteNotFound(target_website_id))?;

        if target.owner_id == viewer.id {
            return Err(ServiceError::SelfExchange);
        }

        let recipient = self
            .db_client
            .get_user(target.owner_id)
            .await?
            .ok_or(ServiceError::UserNotFound(target.owner_id))?;

        if !recipient.is_listed() {
            return Err(ServiceError::WebsiteNotListed(target.id));
        }

        let source_url = source_url
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("https://{}{}", source.domain, DEFAULT_SOURCE_PATH));

        let amount = i64::from(source.domain_authority);
        let pending = Transaction::pending(
            source.id,
            target.id,
            viewer.id,
            recipient.id,
            source_url,
            amount,
        );

        tracing::info!(
            transaction_id = %pending.id,
            source = %source.domain,
            target = %target.domain,
            amount,
            "verifying backlink"
        );

        let outcome = self
            .verifier
            .verify(&pending.source_url, &target.domain)
            .await;

        if !outcome.success {
            let reason = outcome
                .error
                .unwrap_or_else(|| "Verification failed".to_string());
            self.db_client
                .record_failed_exchange(pending, &reason)
                .await?;
            return Err(ServiceError::VerificationFailed(reason));
        }

        let transaction = self
            .db_client
            .settle_exchange(viewer.id, recipient.id, amount, pending)
            .await?;

        let provider = self
            .db_client
            .get_user(viewer.id)
            .await?
            .ok_or(ServiceError::UserNotFound(viewer.id))?;

        Ok(ExchangeReceipt {
            transaction,
            provider,
        })
    }

    pub async fn history(&self, user_id: Uuid) -> Result<Vec<Transaction>, ServiceError> {
        Ok(self.db_client.get_user_transactions(user_id).await?)
    }

    async fn source_website(
        &self,
        viewer: &User,
        source_website_id: Option<Uuid>,
    ) -> Result<Website, ServiceError> {
        match source_website_id {
            Some(id) => {
                let website = self
                    .db_client
                    .get_website(id)
                    .await?
                    .ok_or(ServiceError::WebsiteNotFound(id))?;
                if website.owner_id != viewer.id {
                    return Err(ServiceError::NotWebsiteOwner {
                        website_id: id,
                        user_id: viewer.id,
                    });
                }
                Ok(website)
            }
            None => self
                .db_client
                .get_websites_by_owner(viewer.id)
                .await?
                .into_iter()
                .next()
                .ok_or(ServiceError::NoSourceWebsite),
        }
    }
}
