// service/analysis_service.rs
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::models::websitemodel::{MAX_DOMAIN_AUTHORITY, MIN_DOMAIN_AUTHORITY};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const FALLBACK_NICHE: &str = "General";
const FALLBACK_SUMMARY: &str = "Automated analysis unavailable. Using default estimates.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainAnalysis {
    pub score: i32,
    pub niche: String,
    pub summary: String,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no Gemini API key configured")]
    MissingApiKey,
    #[error("HTTP request error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("Gemini returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("malformed Gemini response: {0}")]
    Malformed(String),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ModelReply {
    da: f64,
    niche: String,
    summary: String,
}

/// Estimates a domain's authority. Uses Gemini when a key is configured and
/// always degrades to a local estimate instead of failing.
#[derive(Debug, Clone)]
pub struct AnalysisService {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AnalysisService {
    pub fn new(client: reqwest::Client, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client,
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_ai_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn analyze(&self, domain: &str) -> DomainAnalysis {
        match self.request_analysis(domain).await {
            Ok(analysis) => {
                tracing::info!(domain, score = analysis.score, niche = %analysis.niche, "AI analysis complete");
                analysis
            }
            Err(AnalysisError::MissingApiKey) => {
                tracing::debug!(domain, "no AI credential, using fallback analysis");
                Self::fallback()
            }
            Err(e) => {
                tracing::warn!(domain, error = %e, "AI analysis failed, using fallback");
                Self::fallback()
            }
        }
    }

    pub fn fallback() -> DomainAnalysis {
        let score = rand::rng().random_range(10..50);
        DomainAnalysis {
            score,
            niche: FALLBACK_NICHE.to_string(),
            summary: FALLBACK_SUMMARY.to_string(),
        }
    }

    async fn request_analysis(&self, domain: &str) -> Result<DomainAnalysis, AnalysisError> {
        let api_key = self.api_key.as_deref().ok_or(AnalysisError::MissingApiKey)?;

        let url = format!(
            "{}/models/{}:generateContent",
            self.base_url,
            urlencoding::encode(&self.model)
        );

        let response = self
            .client
            .post(url)
            .query(&[("key", api_key)])
            .json(&request_body(domain))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::Status(response.status()));
        }

        let body: Value = response.json().await?;
        parse_generate_content(&body)
    }
}

fn request_body(domain: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{
                "text": format!(
                    "Analyze this domain for approximate SEO metrics: {}. Focus on Domain Authority (DA) 1-100, Niche, and a 1-sentence content quality summary.",
                    domain
                )
            }]
        }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": {
                "type": "OBJECT",
                "properties": {
                    "da": { "type": "NUMBER", "description": "Estimated Domain Authority (1-100)" },
                    "niche": { "type": "STRING", "description": "Main category of the site" },
                    "summary": { "type": "STRING", "description": "Brief content summary" }
                },
                "required": ["da", "niche", "summary"]
            }
        }
    })
}

/// Extracts the model's JSON answer from a `generateContent` response.
pub fn parse_generate_content(body: &Value) -> Result<DomainAnalysis, AnalysisError> {
    let text = body["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| AnalysisError::Malformed("missing candidate text".to_string()))?;

    let reply: ModelReply = serde_json::from_str(text)?;

    if !reply.da.is_finite() {
        return Err(AnalysisError::Malformed(format!("non-numeric score {}", reply.da)));
    }
    let niche = reply.niche.trim();
    if niche.is_empty() {
        return Err(AnalysisError::Malformed("empty niche".to_string()));
    }

    let score = (reply.da.round() as i64)
        .clamp(MIN_DOMAIN_AUTHORITY as i64, MAX_DOMAIN_AUTHORITY as i64) as i32;

    Ok(DomainAnalysis {
        score,
        niche: niche.to_string(),
        summary: reply.summary.trim().to_string(),
    })
}
