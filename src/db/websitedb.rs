// db/websitedb.rs
use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::db::DBClient;
use crate::models::{
    usermodel::MIN_VISIBLE_POINTS,
    websitemodel::{MarketplaceListing, Website},
};

#[async_trait]
pub trait WebsiteExt {
    async fn save_website(
        &self,
        owner_id: Uuid,
        domain: &str,
        domain_authority: i32,
        category: &str,
        description: &str,
    ) -> Result<Website, sqlx::Error>;

    async fn get_website(&self, website_id: Uuid) -> Result<Option<Website>, sqlx::Error>;

    async fn get_websites(&self) -> Result<Vec<Website>, sqlx::Error>;

    /// Sites owned by `owner_id`, in registration order.
    async fn get_websites_by_owner(&self, owner_id: Uuid) -> Result<Vec<Website>, sqlx::Error>;

    async fn domain_exists(&self, domain: &str) -> Result<bool, sqlx::Error>;

    /// Sites of other users whose owner currently holds at least
    /// `MIN_VISIBLE_POINTS`. Evaluated against live balances on every call.
    async fn get_marketplace_listings(
        &self,
        viewer_id: Uuid,
    ) -> Result<Vec<MarketplaceListing>, sqlx::Error>;
}

#[async_trait]
impl WebsiteExt for DBClient {
    async fn save_website(
        &self,
        owner_id: Uuid,
        domain: &str,
        domain_authority: i32,
        category: &str,
        description: &str,
    ) -> Result<Website, sqlx::Error> {
        sqlx::query_as::<_, Website>(
            r#"
            INSERT INTO websites (id, owner_id, domain, domain_authority, category, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id, owner_id, domain, domain_authority, category, description, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(domain)
        .bind(domain_authority)
        .bind(category)
        .bind(description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }

    async fn get_website(&self, website_id: Uuid) -> Result<Option<Website>, sqlx::Error> {
        sqlx::query_as::<_, Website>(
            r#"
            SELECT id, owner_id, domain, domain_authority, category, description, created_at
            FROM websites WHERE id = ?
            "#,
        )
        .bind(website_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_websites(&self) -> Result<Vec<Website>, sqlx::Error> {
        sqlx::query_as::<_, Website>(
            r#"
            SELECT id, owner_id, domain, domain_authority, category, description, created_at
            FROM websites ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_websites_by_owner(&self, owner_id: Uuid) -> Result<Vec<Website>, sqlx::Error> {
        sqlx::query_as::<_, Website>(
            r#"
            SELECT id, owner_id, domain, domain_authority, category, description, created_at
            FROM websites WHERE owner_id = ? ORDER BY rowid
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn domain_exists(&self, domain: &str) -> Result<bool, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM websites WHERE domain = ?")
            .bind(domain)
            .fetch_one(&self.pool)
            .await?;
        Ok(count > 0)
    }

    async fn get_marketplace_listings(
        &self,
        viewer_id: Uuid,
    ) -> Result<Vec<MarketplaceListing>, sqlx::Error> {
        sqlx::query_as::<_, MarketplaceListing>(
            r#"
            SELECT w.id, w.owner_id, u.name AS owner_name, u.points AS owner_points,
                   w.domain, w.domain_authority, w.category, w.description
            FROM websites w
            JOIN users u ON u.id = w.owner_id
            WHERE w.owner_id != ? AND u.points >= ?
            ORDER BY w.rowid
            "#,
        )
        .bind(viewer_id)
        .bind(MIN_VISIBLE_POINTS)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::userdb::UserExt;

    #[tokio::test]
    async fn marketplace_hides_own_and_broke_owners() {
        let db = DBClient::in_memory().await.unwrap();
        let viewer = db.find_or_create_user("Viewer", "viewer@example.com", None).await.unwrap();
        let rich = db.find_or_create_user("Rich", "rich@example.com", None).await.unwrap();
        let broke = db.find_or_create_user("Broke", "broke@example.com", None).await.unwrap();

        db.save_website(viewer.id, "viewer.io", 30, "Tech", "mine").await.unwrap();
        let listed = db.save_website(rich.id, "rich.io", 60, "Finance", "listed").await.unwrap();
        db.save_website(broke.id, "broke.io", 20, "Food", "hidden").await.unwrap();

        sqlx::query("UPDATE users SET points = 0 WHERE id = ?")
            .bind(broke.id)
            .execute(&db.pool)
            .await
            .unwrap();

        let listings = db.get_marketplace_listings(viewer.id).await.unwrap();
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].id, listed.id);
        assert_eq!(listings[0].owner_name, "Rich");

        // Recomputed from live balances: topping the owner back up relists the site.
        sqlx::query("UPDATE users SET points = 1 WHERE id = ?")
            .bind(broke.id)
            .execute(&db.pool)
            .await
            .unwrap();
        assert_eq!(db.get_marketplace_listings(viewer.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_domain_is_rejected_by_store() {
        let db = DBClient::in_memory().await.unwrap();
        let owner = db.find_or_create_user("Owner", "owner@example.com", None).await.unwrap();

        db.save_website(owner.id, "dup.io", 10, "General", "first").await.unwrap();
        assert!(db.domain_exists("dup.io").await.unwrap());

        let err = db
            .save_website(owner.id, "dup.io", 10, "General", "second")
            .await
            .unwrap_err();
        match err {
            sqlx::Error::Database(db_err) => assert!(db_err.is_unique_violation()),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
