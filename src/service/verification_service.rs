// service/verification_service.rs
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use scraper::{Html, Selector};
use serde::Serialize;
use thiserror::Error;

pub const INVALID_URL: &str = "Invalid URL";
pub const NOT_FOUND_ON_PAGE: &str = "Target URL not found on source page.";
pub const UNREACHABLE: &str = "Failed to reach source URL";
pub const LINK_NOT_FOUND: &str = "Link not found";
pub const LINK_NOFOLLOW: &str = "Link is nofollow";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerificationOutcome {
    pub fn verified() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(reason.into()),
        }
    }
}

/// Checks that `source_url` carries a followed link to `target_domain`.
/// Implementations never fail; every problem becomes a rejected outcome.
#[async_trait]
pub trait BacklinkVerifier: Send + Sync {
    async fn verify(&self, source_url: &str, target_domain: &str) -> VerificationOutcome;
}

/// Only absolute http(s) URLs can carry a backlink.
pub fn is_absolute_url(candidate: &str) -> bool {
    match reqwest::Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

/// Stand-in verifier: waits `delay`, then succeeds with probability
/// `success_rate`. Calls are independent of each other.
#[derive(Debug, Clone)]
pub struct SimulatedVerifier {
    delay: Duration,
    success_rate: f64,
}

impl SimulatedVerifier {
    pub fn new(delay: Duration, success_rate: f64) -> Self {
        Self {
            delay,
            success_rate: success_rate.clamp(0.0, 1.0),
        }
    }
}

#[async_trait]
impl BacklinkVerifier for SimulatedVerifier {
    async fn verify(&self, source_url: &str, target_domain: &str) -> VerificationOutcome {
        if !is_absolute_url(source_url) {
            return VerificationOutcome::rejected(INVALID_URL);
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let success = rand::rng().random_bool(self.success_rate);
        tracing::debug!(source_url, target_domain, success, "simulated backlink check");

        if success {
            VerificationOutcome::verified()
        } else {
            VerificationOutcome::rejected(NOT_FOUND_ON_PAGE)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkCheck {
    Followed,
    NoFollow,
    Missing,
}

#[derive(Debug, Error)]
#[error("invalid anchor selector: {0}")]
pub struct ScannerError(String);

/// Looks for anchors in the parsed document, so markup inside comments,
/// scripts and attribute values never counts as a link.
#[derive(Debug, Clone)]
pub struct LinkScanner {
    anchors: Selector,
}

impl LinkScanner {
    pub fn new() -> Result<Self, ScannerError> {
        let anchors = Selector::parse("a[href]").map_err(|e| ScannerError(e.to_string()))?;
        Ok(Self { anchors })
    }

    /// Classifies the best link to `target_domain` found in `html`: a
    /// followed link wins over a `nofollow` one.
    pub fn check(&self, html: &str, target_domain: &str) -> LinkCheck {
        let needle = target_domain.trim().to_ascii_lowercase();
        if needle.is_empty() {
            return LinkCheck::Missing;
        }

        let document = Html::parse_document(html);
        let mut result = LinkCheck::Missing;

        for anchor in document.select(&self.anchors) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if !href.to_ascii_lowercase().contains(&needle) {
                continue;
            }

            let nofollow = anchor
                .value()
                .attr("rel")
                .map(|rel| {
                    rel.split_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("nofollow"))
                })
                .unwrap_or(false);
            if !nofollow {
                return LinkCheck::Followed;
            }
            result = LinkCheck::NoFollow;
        }
        result
    }
}

/// Fetches the source page and looks for a followed link to the target.
#[derive(Debug, Clone)]
pub struct CrawlVerifier {
    client: reqwest::Client,
    scanner: LinkScanner,
}

impl CrawlVerifier {
    pub fn new(client: reqwest::Client) -> Result<Self, ScannerError> {
        Ok(Self {
            client,
            scanner: LinkScanner::new()?,
        })
    }
}

#[async_trait]
impl BacklinkVerifier for CrawlVerifier {
    async fn verify(&self, source_url: &str, target_domain: &str) -> VerificationOutcome {
        if !is_absolute_url(source_url) {
            return VerificationOutcome::rejected(INVALID_URL);
        }

        let page = match self.client.get(source_url.trim()).send().await {
            Ok(response) if response.status().is_success() => response.text().await,
            Ok(response) => {
                tracing::info!(source_url, status = %response.status(), "source page returned an error");
                return VerificationOutcome::rejected(UNREACHABLE);
            }
            Err(e) => {
                tracing::info!(source_url, error = %e, "source page unreachable");
                return VerificationOutcome::rejected(UNREACHABLE);
            }
        };

        let html = match page {
            Ok(html) => html,
            Err(e) => {
                tracing::info!(source_url, error = %e, "failed to read source page");
                return VerificationOutcome::rejected(UNREACHABLE);
            }
        };

        match self.scanner.check(&html, target_domain) {
            LinkCheck::Followed => VerificationOutcome::verified(),
            LinkCheck::NoFollow => VerificationOutcome::rejected(LINK_NOFOLLOW),
            LinkCheck::Missing => VerificationOutcome::rejected(LINK_NOT_FOUND),
        }
    }
}
