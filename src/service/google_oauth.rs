use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};
use thiserror::Error;
use tokio::sync::Mutex;

const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const KEY_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, PartialEq)]
pub struct GoogleUserInfo {
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
struct GoogleClaims {
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("JWT validation error: {0}")]
    JwtValidation(String),
    #[error("Missing claim: {0}")]
    MissingClaim(&'static str),
}

#[derive(Debug, Deserialize)]
struct GoogleCertsResponse {
    keys: Vec<GooglePublicKey>,
}

#[derive(Debug, Deserialize, Clone)]
struct GooglePublicKey {
    kid: String,
    n: String,
    e: String,
}

type KeyCache = Option<(HashMap<String, GooglePublicKey>, Instant)>;

/// Verifies Google sign-in ID tokens against Google's published keys.
#[derive(Debug, Clone)]
pub struct GoogleAuthService {
    client_id: String,
    http: reqwest::Client,
    certs_url: String,
    cached_public_keys: Arc<Mutex<KeyCache>>,
}

impl GoogleAuthService {
    pub fn new(client_id: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            client_id: client_id.into(),
            http,
            certs_url: GOOGLE_CERTS_URL.to_string(),
            cached_public_keys: Arc::new(Mutex::new(None)),
        }
    }

    async fn fetch_public_keys(&self) -> Result<HashMap<String, GooglePublicKey>, OAuthError> {
        let response = self.http.get(&self.certs_url).send().await?;

        if !response.status().is_success() {
            return Err(OAuthError::JwtValidation(format!(
                "Failed to fetch Google public keys: HTTP {}",
                response.status()
            )));
        }

        let certs: GoogleCertsResponse = response.json().await?;
        Ok(certs
            .keys
            .into_iter()
            .map(|key| (key.kid.clone(), key))
            .collect())
    }

    /// Looks up `kid`, refreshing the cache when it is stale or does not
    /// know the key (Google rotates keys).
    async fn public_key(&self, kid: &str) -> Result<GooglePublicKey, OAuthError> {
        let mut cache = self.cached_public_keys.lock().await;

        if let Some((keys, fetched_at)) = cache.as_ref() {
            if fetched_at.elapsed() < KEY_CACHE_TTL {
                if let Some(key) = keys.get(kid) {
                    return Ok(key.clone());
                }
            }
        }

        let keys = self.fetch_public_keys().await?;
        tracing::debug!(count = keys.len(), "refreshed Google signing keys");
        let key = keys.get(kid).cloned();
        *cache = Some((keys, Instant::now()));

        key.ok_or_else(|| {
            OAuthError::JwtValidation(format!("No public key found for Key ID: {}", kid))
        })
    }

    /// Checks signature, audience, issuer and expiry before trusting any
    /// claim in `id_token`.
    pub async fn validate_id_token(&self, id_token: &str) -> Result<GoogleUserInfo, OAuthError> {
        let header = decode_header(id_token)
            .map_err(|e| OAuthError::JwtValidation(format!("Invalid token header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(OAuthError::JwtValidation(format!(
                "Unexpected signing algorithm {:?}",
                header.alg
            )));
        }

        let kid = header.kid.ok_or_else(|| {
            OAuthError::JwtValidation("Missing key ID in token header".to_string())
        })?;

        let public_key = self.public_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&["https://accounts.google.com", "accounts.google.com"]);

        let decoding_key = DecodingKey::from_rsa_components(&public_key.n, &public_key.e)
            .map_err(|e| {
                OAuthError::JwtValidation(format!("Failed to create decoding key: {}", e))
            })?;

        let token_data = decode::<GoogleClaims>(id_token, &decoding_key, &validation)
            .map_err(|e| OAuthError::JwtValidation(format!("Token validation failed: {}", e)))?;

        user_info_from_claims(token_data.claims)
    }
}

fn user_info_from_claims(claims: GoogleClaims) -> Result<GoogleUserInfo, OAuthError> {
    let email = claims
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or(OAuthError::MissingClaim("email"))?;

    if claims.email_verified == Some(false) {
        return Err(OAuthError::JwtValidation("Email address is not verified".to_string()));
    }

    let name = claims
        .name
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or(&email).to_string());

    Ok(GoogleUserInfo {
        email,
        name,
        picture: claims.picture,
    })
}
