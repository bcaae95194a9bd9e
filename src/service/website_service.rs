// service/website_service.rs
use std::sync::Arc;

use serde::Serialize;

use crate::{
    db::{db::DBClient, transactiondb::TransactionExt, websitedb::WebsiteExt},
    models::{usermodel::User, websitemodel::Website},
    service::{
        analysis_service::{AnalysisService, DomainAnalysis},
        error::ServiceError,
    },
    utils::domain::normalize_domain,
};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_sites: usize,
    pub points: i64,
    pub total_exchanges: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub user: User,
    pub sites: Vec<Website>,
    pub stats: DashboardStats,
}

#[derive(Debug, Clone)]
pub struct WebsiteService {
    db_client: Arc<DBClient>,
    analysis_service: Arc<AnalysisService>,
}

impl WebsiteService {
    pub fn new(db_client: Arc<DBClient>, analysis_service: Arc<AnalysisService>) -> Self {
        Self {
            db_client,
            analysis_service,
        }
    }

    /// Registers `domain` for `owner`. The authority score and category come
    /// from the analysis; a blank description is replaced by its summary.
    pub async fn register_site(
        &self,
        owner: &User,
        domain: &str,
        description: Option<&str>,
    ) -> Result<(Website, DomainAnalysis), ServiceError> {
        let domain = normalize_domain(domain).map_err(ServiceError::Validation)?;

        if self.db_client.domain_exists(&domain).await? {
            return Err(ServiceError::DomainTaken(domain));
        }

        let analysis = self.analysis_service.analyze(&domain).await;

        let description = description
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .unwrap_or(analysis.summary.as_str());

        let website = self
            .db_client
            .save_website(
                owner.id,
                &domain,
                analysis.score,
                &analysis.niche,
                description,
            )
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                    ServiceError::DomainTaken(domain.clone())
                }
                other => ServiceError::Database(other),
            })?;

        tracing::info!(
            owner_id = %owner.id,
            domain = %website.domain,
            domain_authority = website.domain_authority,
            "website registered"
        );

        Ok((website, analysis))
    }

    pub async fn dashboard(&self, user: User) -> Result<Dashboard, ServiceError> {
        let sites = self.db_client.get_websites_by_owner(user.id).await?;
        let total_exchanges = self.db_client.get_user_transactions(user.id).await?.len();

        Ok(Dashboard {
            stats: DashboardStats {
                active_sites: sites.len(),
                points: user.points,
                total_exchanges,
            },
            user,
            sites,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::userdb::UserExt;

    async fn service() -> (WebsiteService, Arc<DBClient>) {
        let db = Arc::new(DBClient::in_memory().await.unwrap());
        let analysis = Arc::new(AnalysisService::new(reqwest::Client::new(), None, "gemini-1.5-flash"));
        (WebsiteService::new(db.clone(), analysis), db)
    }

    #[tokio::test]
    async fn registers_with_fallback_analysis() {
        let (service, db) = service().await;
        let owner = db.find_or_create_user("Owner", "owner@example.com", None).await.unwrap();

        let (site, analysis) = service
            .register_site(&owner, "https://www.NewSite.dev/about", None)
            .await
            .unwrap();

        assert_eq!(site.domain, "newsite.dev");
        assert_eq!(site.owner_id, owner.id);
        assert_eq!(site.domain_authority, analysis.score);
        assert!((10..50).contains(&site.domain_authority));
        assert_eq!(site.category, "General");
        assert_eq!(site.description, analysis.summary);
    }

    #[tokio::test]
    async fn keeps_user_description() {
        let (service, db) = service().await;
        let owner = db.find_or_create_user("Owner", "owner@example.com", None).await.unwrap();

        let (site, _) = service
            .register_site(&owner, "recipes.net", Some("  Weeknight dinners  "))
            .await
            .unwrap();
        assert_eq!(site.description, "Weeknight dinners");
    }

    #[tokio::test]
    async fn rejects_duplicate_and_invalid_domains() {
        let (service, db) = service().await;
        let owner = db.find_or_create_user("Owner", "owner@example.com", None).await.unwrap();

        service.register_site(&owner, "taken.io", None).await.unwrap();
        let dup = service.register_site(&owner, "http://WWW.taken.io/", None).await;
        assert!(matches!(dup, Err(ServiceError::DomainTaken(d)) if d == "taken.io"));

        let invalid = service.register_site(&owner, "   ", None).await;
        assert!(matches!(invalid, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn dashboard_lists_own_sites_in_order() {
        let (service, db) = service().await;
        let owner = db.find_or_create_user("Owner", "owner@example.com", None).await.unwrap();
        let other = db.find_or_create_user("Other", "other@example.com", None).await.unwrap();

        service.register_site(&owner, "first.io", None).await.unwrap();
        service.register_site(&other, "elsewhere.io", None).await.unwrap();
        service.register_site(&owner, "second.io", None).await.unwrap();

        let dashboard = service.dashboard(owner.clone()).await.unwrap();
        let domains: Vec<_> = dashboard.sites.iter().map(|s| s.domain.as_str()).collect();
        assert_eq!(domains, vec!["first.io", "second.io"]);
        assert_eq!(dashboard.stats.active_sites, 2);
        assert_eq!(dashboard.stats.points, owner.points);
        assert_eq!(dashboard.stats.total_exchanges, 0);
    }
}
