mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

#[cfg(test)]
mod test_support;

use std::{path::Path, sync::Arc, time::Duration};

use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use config::{Config, VerificationMode};
use db::db::DBClient;
use dotenv::dotenv;
use routes::create_router;
use service::{
    analysis_service::AnalysisService,
    bootstrap::prepare_store,
    exchange_service::ExchangeService,
    google_oauth::GoogleAuthService,
    verification_service::{BacklinkVerifier, CrawlVerifier, ScannerError, SimulatedVerifier},
    website_service::WebsiteService,
};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("failed to build link scanner: {0}")]
    Scanner(#[from] ScannerError),
}

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub website_service: Arc<WebsiteService>,
    pub exchange_service: Arc<ExchangeService>,
    pub google_auth: Option<Arc<GoogleAuthService>>,
}

impl AppState {
    pub fn new(env: Config, db_client: Arc<DBClient>) -> Result<Self, StartupError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(env.http_timeout_secs))
            .build()?;

        let analysis_service = Arc::new(AnalysisService::new(
            http.clone(),
            env.gemini_api_key.clone(),
            env.gemini_model.clone(),
        ));

        let verifier: Arc<dyn BacklinkVerifier> = match env.verification_mode {
            VerificationMode::Simulated => Arc::new(SimulatedVerifier::new(
                Duration::from_millis(env.verification_delay_ms),
                env.verification_success_rate,
            )),
            VerificationMode::Crawl => Arc::new(CrawlVerifier::new(http.clone())?),
        };

        tracing::info!(ai_analysis = analysis_service.is_ai_enabled(), "domain analysis ready");

        let google_auth = env
            .google_client_id
            .as_ref()
            .map(|client_id| Arc::new(GoogleAuthService::new(client_id.clone(), http.clone())));

        Ok(AppState {
            website_service: Arc::new(WebsiteService::new(
                db_client.clone(),
                analysis_service.clone(),
            )),
            exchange_service: Arc::new(ExchangeService::new(db_client.clone(), verifier)),
            google_auth,
            db_client,
            env,
        })
    }
}

/// Loads `.env` (or `env_file`) into the process environment and builds
/// the log filter from it, so `RUST_LOG` may live in the env file.
fn load_env(env_file: Option<&Path>) -> EnvFilter {
    match env_file {
        Some(path) => {
            let _ = dotenv::from_path(path);
        }
        None => {
            dotenv().ok();
        }
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(load_env(None))
        .init();

    let config = match Config::init() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let db_client = match DBClient::connect(&config.database_url).await {
        Ok(db_client) => {
            tracing::info!("connection to the database is successful");
            Arc::new(db_client)
        }
        Err(err) => {
            tracing::error!("failed to connect to the database: {:?}", err);
            std::process::exit(1);
        }
    };

    if let Err(e) = prepare_store(&db_client, config.snapshot_path.as_deref().map(Path::new)).await {
        tracing::error!("failed to prepare the store: {}", e);
        std::process::exit(1);
    }

    let allowed_origin = match config.app_url.parse::<HeaderValue>() {
        Ok(origin) => origin,
        Err(e) => {
            tracing::error!("APP_URL is not a valid origin: {}", e);
            std::process::exit(1);
        }
    };

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list([allowed_origin]))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST]);

    let app_state = match AppState::new(config.clone(), db_client) {
        Ok(app_state) => app_state,
        Err(e) => {
            tracing::error!("failed to start services: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        verification_mode = ?config.verification_mode,
        google_login = config.google_client_id.is_some(),
        "services ready"
    );

    let app = create_router(Arc::new(app_state)).layer(cors);

    let listener = match tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("failed to bind port {}: {}", config.port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("server is running on http://localhost:{}", config.port);

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_from_env_file_reaches_the_filter() {
        let path = std::env::temp_dir().join(format!("linkauthority-{}.env", uuid::Uuid::new_v4()));
        std::fs::write(&path, "RUST_LOG=linkauthority=debug\n").unwrap();
        std::env::remove_var("RUST_LOG");

        let filter = load_env(Some(path.as_path()));
        let _ = std::fs::remove_file(&path);
        std::env::remove_var("RUST_LOG");

        assert_eq!(filter.to_string(), "linkauthority=debug");
    }
}
