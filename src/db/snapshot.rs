// db/snapshot.rs
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{
    db::DBClient,
    transactiondb::{insert_transaction, TransactionExt},
    userdb::{normalize_email, UserExt},
    websitedb::WebsiteExt,
};
use crate::models::{transactionmodel::Transaction, usermodel::User, websitemodel::Website};

/// Whole-store dump in the `linkauthority_db` layout:
/// `{users, websites, transactions}`, transactions newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub websites: Vec<Website>,
    pub transactions: Vec<Transaction>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.websites.is_empty() && self.transactions.is_empty()
    }
}

/// Exported document: the snapshot under the `linkauthority_db` key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotFile {
    pub linkauthority_db: Snapshot,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Wrapped(SnapshotFile),
    Bare(Snapshot),
}

/// Reads either an exported `SnapshotFile` or a bare `Snapshot`.
pub fn parse_snapshot(raw: &str) -> Result<Snapshot, serde_json::Error> {
    Ok(match serde_json::from_str(raw)? {
        SnapshotDocument::Wrapped(file) => file.linkauthority_db,
        SnapshotDocument::Bare(snapshot) => snapshot,
    })
}

#[async_trait]
pub trait SnapshotExt {
    async fn export_snapshot(&self) -> Result<Snapshot, sqlx::Error>;

    /// Loads `snapshot` in a single database transaction. Rows already
    /// present (same id) make the import fail as a whole.
    async fn import_snapshot(&self, snapshot: &Snapshot) -> Result<(), sqlx::Error>;

    async fn is_store_empty(&self) -> Result<bool, sqlx::Error>;
}

#[async_trait]
impl SnapshotExt for DBClient {
    async fn export_snapshot(&self) -> Result<Snapshot, sqlx::Error> {
        Ok(Snapshot {
            users: self.get_users().await?,
            websites: self.get_websites().await?,
            transactions: self.get_transactions().await?,
        })
    }

    async fn import_snapshot(&self, snapshot: &Snapshot) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        for user in &snapshot.users {
            sqlx::query(
                "INSERT INTO users (id, name, email, avatar, points, created_at) VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(user.id)
            .bind(user.name.as_str())
            .bind(normalize_email(&user.email))
            .bind(user.avatar.as_deref())
            .bind(user.points)
            .bind(user.created_at)
            .execute(&mut *tx)
            .await?;
        }

        for website in &snapshot.websites {
            sqlx::query(
                r#"
                INSERT INTO websites (id, owner_id, domain, domain_authority, category, description, created_at)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(website.id)
            .bind(website.owner_id)
            .bind(website.domain.as_str())
            .bind(website.domain_authority)
            .bind(website.category.as_str())
            .bind(website.description.as_str())
            .bind(website.created_at)
            .execute(&mut *tx)
            .await?;
        }

        // Stored oldest first so the log keeps its order.
        for transaction in snapshot.transactions.iter().rev() {
            insert_transaction(&mut tx, transaction).await?;
        }

        tx.commit().await?;

        tracing::info!(
            users = snapshot.users.len(),
            websites = snapshot.websites.len(),
            transactions = snapshot.transactions.len(),
            "snapshot imported"
        );
        Ok(())
    }

    async fn is_store_empty(&self) -> Result<bool, sqlx::Error> {
        let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(users == 0)
    }
}

/// Built-in data for a fresh store.
pub fn seed_snapshot() -> Snapshot {
    let now = Utc::now();

    let user = |name: &str, email: &str, points: i64| User {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: email.to_string(),
        avatar: None,
        points,
        created_at: now,
    };

    let alex = user("Alex SEO", "alex@example.com", 150);
    let dev = user("Dev Solutions", "dev@example.com", 80);
    let pro = user("Marketing Pro", "pro@example.com", 12);

    let site = |owner: &User, domain: &str, da: i32, description: &str, category: &str| Website {
        id: Uuid::new_v4(),
        owner_id: owner.id,
        domain: domain.to_string(),
        domain_authority: da,
        category: category.to_string(),
        description: description.to_string(),
        created_at: now,
    };

    let websites = vec![
        site(&alex, "techcrunch.com", 92, "Tech News and Analysis", "Technology"),
        site(&dev, "mydevblog.io", 35, "Personal coding tutorials", "Education"),
        site(&pro, "healthyliving.net", 25, "Lifestyle and nutrition tips", "Health"),
    ];

    Snapshot {
        users: vec![alex, dev, pro],
        websites,
        transactions: Vec::new(),
    }
}
