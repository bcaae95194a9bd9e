// db/db.rs
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use std::str::FromStr;

const SCHEMA: [&str; 6] = [
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        avatar TEXT,
        points INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS websites (
        id BLOB PRIMARY KEY NOT NULL,
        owner_id BLOB NOT NULL REFERENCES users(id),
        domain TEXT NOT NULL UNIQUE,
        domain_authority INTEGER NOT NULL CHECK (domain_authority BETWEEN 1 AND 100),
        category TEXT NOT NULL,
        description TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS transactions (
        seq INTEGER PRIMARY KEY AUTOINCREMENT,
        id BLOB NOT NULL UNIQUE,
        source_website_id BLOB NOT NULL REFERENCES websites(id),
        target_website_id BLOB NOT NULL REFERENCES websites(id),
        provider_user_id BLOB NOT NULL REFERENCES users(id),
        recipient_user_id BLOB NOT NULL REFERENCES users(id),
        source_url TEXT NOT NULL,
        points_transferred INTEGER NOT NULL,
        status TEXT NOT NULL,
        failure_reason TEXT,
        timestamp TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_websites_owner ON websites(owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_provider ON transactions(provider_user_id)",
    "CREATE INDEX IF NOT EXISTS idx_transactions_recipient ON transactions(recipient_user_id)",
];

#[derive(Debug, Clone)]
pub struct DBClient {
    pub pool: Pool<Sqlite>,
}

impl DBClient {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        DBClient { pool }
    }

    /// Open (creating if needed) the database at `database_url` and make sure
    /// the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let client = DBClient::new(pool);
        client.init_schema().await?;
        Ok(client)
    }

    /// Private in-memory store. A single connection keeps every query on the
    /// same database.
    pub async fn in_memory() -> Result<Self, sqlx::Error> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let client = DBClient::new(pool);
        client.init_schema().await?;
        Ok(client)
    }

    pub async fn init_schema(&self) -> Result<(), sqlx::Error> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        tracing::debug!("database schema ready");
        Ok(())
    }
}
