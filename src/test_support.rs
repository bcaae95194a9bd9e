use std::sync::Arc;

use crate::{
    config::{Config, VerificationMode},
    db::db::DBClient,
    service::bootstrap::prepare_store,
    AppState,
};

pub fn test_config(success_rate: f64) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        app_url: "http://localhost:5173".to_string(),
        jwt_secret: "test-secret".to_string(),
        jwt_maxage: 60,
        port: 0,
        google_client_id: None,
        gemini_api_key: None,
        gemini_model: "gemini-1.5-flash".to_string(),
        verification_mode: VerificationMode::Simulated,
        verification_delay_ms: 0,
        verification_success_rate: success_rate,
        http_timeout_secs: 2,
        snapshot_path: None,
    }
}

/// Seeded in-memory store, no AI key, instant verifications succeeding with
/// probability `success_rate`.
pub async fn test_state(success_rate: f64) -> Arc<AppState> {
    let db_client = Arc::new(DBClient::in_memory().await.unwrap());
    prepare_store(&db_client, None).await.unwrap();
    Arc::new(AppState::new(test_config(success_rate), db_client).unwrap())
}
